use std::path::Path;

use cgmath::{Matrix, Matrix3, Matrix4, SquareMatrix, Vector3, Vector4};

use super::{AssetError, DecodedModel};
use crate::gfx::scene::Mesh;

/// Loads a `.glb` or `.gltf` file, resolving external buffers next to it
pub fn load_path(path: &Path) -> Result<DecodedModel, AssetError> {
    let (document, buffers, _images) = gltf::import(path)?;
    decode(&document, &buffers)
}

/// Loads a model from fetched bytes; only embedded buffers can be resolved
pub fn load_slice(bytes: &[u8]) -> Result<DecodedModel, AssetError> {
    let (document, buffers, _images) = gltf::import_slice(bytes)?;
    decode(&document, &buffers)
}

fn decode(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<DecodedModel, AssetError> {
    let mut meshes = Vec::new();
    let mut color = None;

    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                walk_node(&node, Matrix4::identity(), buffers, &mut meshes, &mut color);
            }
        }
        // Scene-less files still carry meshes; show them untransformed
        None => {
            for mesh in document.meshes() {
                convert_mesh(&mesh, Matrix4::identity(), buffers, &mut meshes, &mut color);
            }
        }
    }

    Ok(DecodedModel { meshes, color })
}

fn walk_node(
    node: &gltf::Node,
    parent: Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    meshes: &mut Vec<Mesh>,
    color: &mut Option<[f32; 4]>,
) {
    let world = parent * Matrix4::from(node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        convert_mesh(&mesh, world, buffers, meshes, color);
    }
    for child in node.children() {
        walk_node(&child, world, buffers, meshes, color);
    }
}

fn convert_mesh(
    mesh: &gltf::Mesh,
    world: Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    meshes: &mut Vec<Mesh>,
    color: &mut Option<[f32; 4]>,
) {
    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::debug!(
                "skipping {:?} primitive in mesh {:?}",
                primitive.mode(),
                mesh.name()
            );
            continue;
        }
        if let Some(converted) = convert_primitive(&primitive, world, buffers) {
            let material = primitive.material();
            if color.is_none() && material.index().is_some() {
                *color = Some(material.pbr_metallic_roughness().base_color_factor());
            }
            meshes.push(converted);
        }
    }
}

/// Bakes `world` into the primitive's vertices
fn convert_primitive(
    primitive: &gltf::Primitive,
    world: Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
) -> Option<Mesh> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    if positions.is_empty() || indices.len() < 3 {
        return None;
    }

    let flat_positions: Vec<f32> = positions
        .iter()
        .flat_map(|p| {
            let v = world * Vector4::new(p[0], p[1], p[2], 1.0);
            [v.x, v.y, v.z]
        })
        .collect();

    let normals = match reader.read_normals() {
        Some(normals) => {
            let linear = Matrix3::from_cols(world.x.truncate(), world.y.truncate(), world.z.truncate());
            let normal_matrix = linear.invert().map(|m| m.transpose()).unwrap_or(linear);
            normals
                .flat_map(|n| {
                    let v = normal_matrix * Vector3::new(n[0], n[1], n[2]);
                    let len = (v.x * v.x + v.y * v.y + v.z * v.z).sqrt();
                    if len > 0.0 {
                        [v.x / len, v.y / len, v.z / len]
                    } else {
                        [0.0, 1.0, 0.0]
                    }
                })
                .collect()
        }
        None => Mesh::calculate_face_normals(&flat_positions, &indices),
    };

    Some(Mesh::new(flat_positions, normals, indices))
}
