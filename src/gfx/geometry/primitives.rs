//! # Primitive Shape Generation
//!
//! Ring, plane and box meshes. Flat shapes lie in the XZ plane with +Y
//! normals, matching the up axis of hit-test poses.

use super::GeometryData;
use std::f32::consts::PI;

/// Generate a flat annulus in the XZ plane
///
/// # Arguments
/// * `inner_radius` - Radius of the hole
/// * `outer_radius` - Outer edge radius
/// * `segments` - Number of angular segments (clamped to at least 3)
///
/// Returns a ring centered at the origin with normals pointing up (+Y).
pub fn generate_ring(inner_radius: f32, outer_radius: f32, segments: u32) -> GeometryData {
    let mut data = GeometryData::new();
    let segs = segments.max(3);

    for i in 0..=segs {
        let angle = i as f32 * 2.0 * PI / segs as f32;
        let (sin_a, cos_a) = angle.sin_cos();
        let u = i as f32 / segs as f32;

        data.vertices.push([inner_radius * cos_a, 0.0, -inner_radius * sin_a]);
        data.normals.push([0.0, 1.0, 0.0]);
        data.tex_coords.push([u, 0.0]);

        data.vertices.push([outer_radius * cos_a, 0.0, -outer_radius * sin_a]);
        data.normals.push([0.0, 1.0, 0.0]);
        data.tex_coords.push([u, 1.0]);
    }

    // Counter-clockwise when viewed from +Y
    for i in 0..segs {
        let inner = i * 2;
        let outer = inner + 1;
        let next_inner = inner + 2;
        let next_outer = inner + 3;

        data.indices.extend_from_slice(&[inner, outer, next_outer]);
        data.indices.extend_from_slice(&[inner, next_outer, next_inner]);
    }

    data
}

/// Generate a plane in the XZ plane
///
/// # Arguments
/// * `width` - Width of the plane (X direction)
/// * `depth` - Depth of the plane (Z direction)
/// * `width_segments` - Number of subdivisions along width
/// * `depth_segments` - Number of subdivisions along depth
///
/// Returns a plane centered at the origin with normal pointing up (+Y).
pub fn generate_plane(width: f32, depth: f32, width_segments: u32, depth_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(1);
    let d_segs = depth_segments.max(1);

    for z in 0..=d_segs {
        let v = z as f32 / d_segs as f32;
        let pos_z = (v - 0.5) * depth;

        for x in 0..=w_segs {
            let u = x as f32 / w_segs as f32;
            let pos_x = (u - 0.5) * width;

            data.vertices.push([pos_x, 0.0, pos_z]);
            data.normals.push([0.0, 1.0, 0.0]);
            data.tex_coords.push([u, v]);
        }
    }

    // Rows advance toward +Z, so (i, next_row, i + 1) winds counter-clockwise from above
    for z in 0..d_segs {
        for x in 0..w_segs {
            let i = z * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;

            data.indices.extend_from_slice(&[i, next_row, i + 1]);
            data.indices.extend_from_slice(&[next_row, next_row + 1, i + 1]);
        }
    }

    data
}

/// Generate an axis-aligned box centered at the origin with flat-shaded faces
pub fn generate_box(width: f32, height: f32, depth: f32) -> GeometryData {
    let mut data = GeometryData::new();
    let (hx, hy, hz) = (width * 0.5, height * 0.5, depth * 0.5);

    // (normal, u axis, v axis) per face; corners are normal +/- u +/- v
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ];

    for (normal, u, v) in faces {
        let base = data.vertices.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let corner = |axis: usize| (normal[axis] + su * u[axis] + sv * v[axis]);
            data.vertices.push([corner(0) * hx, corner(1) * hy, corner(2) * hz]);
            data.normals.push(normal);
            data.tex_coords.push([(su + 1.0) * 0.5, (sv + 1.0) * 0.5]);
        }
        data.indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    data
}
