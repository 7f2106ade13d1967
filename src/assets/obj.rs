use std::io::Cursor;
use std::path::Path;

use super::{AssetError, DecodedModel};
use crate::gfx::scene::Mesh;

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

/// Loads an OBJ file and its MTL library if present
pub fn load_path(path: &Path) -> Result<DecodedModel, AssetError> {
    let (models, materials) = tobj::load_obj(path, &load_options())?;
    let materials = materials.unwrap_or_else(|err| {
        log::debug!("no usable MTL for {}: {}", path.display(), err);
        Vec::new()
    });
    Ok(decode(models, &materials))
}

/// Loads OBJ text fetched over the network; material libraries are not followed
pub fn load_bytes(bytes: &[u8]) -> Result<DecodedModel, AssetError> {
    let mut reader = Cursor::new(bytes);
    let (models, _) = tobj::load_obj_buf(&mut reader, &load_options(), |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })?;
    Ok(decode(models, &[]))
}

fn decode(models: Vec<tobj::Model>, materials: &[tobj::Material]) -> DecodedModel {
    let color = models
        .iter()
        .find_map(|m| m.mesh.material_id)
        .and_then(|id| materials.get(id))
        .and_then(|mtl| {
            mtl.diffuse
                .map(|[r, g, b]| [r, g, b, mtl.dissolve.unwrap_or(1.0)])
        });

    let meshes = models
        .into_iter()
        .filter(|m| !m.mesh.indices.is_empty())
        .map(|m| {
            let mesh = m.mesh;
            // Use normals from OBJ if available, otherwise calculate them
            let normals = if mesh.normals.len() == mesh.positions.len() {
                mesh.normals
            } else {
                Mesh::calculate_face_normals(&mesh.positions, &mesh.indices)
            };
            Mesh::new(mesh.positions, normals, mesh.indices)
        })
        .collect();

    DecodedModel { meshes, color }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
o quad
v -0.5 0.0 -0.5
v 0.5 0.0 -0.5
v 0.5 0.0 0.5
v -0.5 0.0 0.5
f 1 4 3 2
";

    #[test]
    fn quad_is_triangulated_with_computed_normals() {
        let decoded = load_bytes(QUAD.as_bytes()).unwrap();

        assert_eq!(decoded.meshes.len(), 1);
        let mesh = &decoded.meshes[0];
        assert_eq!(mesh.triangle_count(), 2);
        for v in mesh.vertices() {
            assert!((v.normal[1] - 1.0).abs() < 1e-6);
        }
        assert!(decoded.color.is_none());
    }

    #[test]
    fn mtl_diffuse_becomes_model_color() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("red.mtl"), "newmtl red\nKd 1.0 0.0 0.0\n").unwrap();
        let obj = QUAD.replacen("o quad\n", "mtllib red.mtl\no quad\nusemtl red\n", 1);
        let path = dir.path().join("red.obj");
        std::fs::write(&path, obj).unwrap();

        let decoded = load_path(&path).unwrap();

        assert_eq!(decoded.color, Some([1.0, 0.0, 0.0, 1.0]));
    }
}
