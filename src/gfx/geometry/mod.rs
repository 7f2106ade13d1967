//! # Procedural Geometry Generation
//!
//! Shapes built in code rather than loaded from model files: the reticle
//! ring, surface planes and the placeholder box.
//!
//! ## Usage
//!
//! ```rust
//! use arplace::gfx::geometry::{generate_plane, generate_ring};
//!
//! // Reticle ring, 32 segments
//! let ring = generate_ring(0.05, 0.06, 32);
//!
//! // 10x10 floor with 4 subdivisions
//! let floor = generate_plane(10.0, 10.0, 4, 4);
//! assert_eq!(ring.triangle_count(), 64);
//! ```

pub mod primitives;

pub use primitives::*;

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    /// Create a new empty geometry data structure
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            tex_coords: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Get the number of vertices in this geometry
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles in this geometry
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleaves positions and normals into renderer vertices
    pub fn to_scene_format(&self) -> (Vec<crate::gfx::scene::vertex::Vertex3D>, Vec<u32>) {
        use crate::gfx::scene::vertex::Vertex3D;

        let vertices: Vec<Vertex3D> = (0..self.vertices.len())
            .map(|i| {
                Vertex3D {
                    position: self.vertices[i],
                    normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                }
            })
            .collect();

        (vertices, self.indices.clone())
    }
}

impl Default for GeometryData {
    fn default() -> Self {
        Self::new()
    }
}
