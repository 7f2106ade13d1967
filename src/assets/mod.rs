//! # Model Loading
//!
//! Background loading of `.glb`/`.gltf` and `.obj` models from local paths,
//! `file://` URLs or `http(s)://` URLs into scene [`Object`]s.
//!
//! ```no_run
//! use arplace::assets::{AssetLoader, ModelDefaults};
//!
//! let loader = AssetLoader::new(ModelDefaults::default());
//! let mut handle = loader.load_model("model.glb");
//!
//! // Poll from a frame loop...
//! if let Some(result) = handle.try_take() {
//!     println!("loaded: {:?}", result.map(|object| object.name));
//! }
//! ```
//!
//! [`Object`]: crate::gfx::scene::Object

pub mod gltf;
pub mod loader;
pub mod obj;

pub use loader::{AssetLoader, AssetSource, ModelDefaults, ModelFormat, ModelHandle};

use crate::gfx::scene::Mesh;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("unsupported model format '{0}' (expected glb, gltf or obj)")]
    UnsupportedFormat(String),
    #[error("invalid glTF: {0}")]
    Gltf(#[from] ::gltf::Error),
    #[error("invalid OBJ: {0}")]
    Obj(#[from] tobj::LoadError),
    #[error("model contains no triangle geometry")]
    EmptyModel,
    #[error("model loader stopped before delivering a result")]
    Cancelled,
    #[error("could not start model loader thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Geometry and base color decoded from a model file
pub struct DecodedModel {
    pub meshes: Vec<Mesh>,
    pub color: Option<[f32; 4]>,
}
