use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread;

use cgmath::{One, Quaternion, Vector3};
use futures::channel::oneshot;
use log::{error, info};

use super::{gltf, obj, AssetError, DecodedModel};
use crate::gfx::scene::Object;

/// Where a model is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    File(PathBuf),
    Http(String),
}

impl AssetSource {
    /// `http(s)://` URLs are fetched, `file://` URLs and bare paths are read from disk
    pub fn parse(url: &str) -> Self {
        let trimmed = url.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            AssetSource::Http(trimmed.to_string())
        } else if let Some(path) = trimmed.strip_prefix("file://") {
            AssetSource::File(PathBuf::from(path))
        } else {
            AssetSource::File(PathBuf::from(trimmed))
        }
    }

    /// Last path segment without query or fragment
    fn file_name(&self) -> &str {
        match self {
            AssetSource::File(path) => path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
            AssetSource::Http(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                path.rsplit('/').next().unwrap_or(path)
            }
        }
    }

    /// Object name for the loaded model
    pub fn stem(&self) -> &str {
        let name = self.file_name();
        match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ if name.is_empty() => "model",
            _ => name,
        }
    }

    pub fn extension(&self) -> Option<String> {
        self.file_name()
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Glb,
    Gltf,
    Obj,
}

impl ModelFormat {
    pub fn from_source(source: &AssetSource) -> Result<Self, AssetError> {
        match source.extension().as_deref() {
            Some("glb") => Ok(ModelFormat::Glb),
            Some("gltf") => Ok(ModelFormat::Gltf),
            Some("obj") => Ok(ModelFormat::Obj),
            other => Err(AssetError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }
}

/// Scale, position and fallback color given to every loaded model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelDefaults {
    pub scale: f32,
    pub position: Vector3<f32>,
    pub color: [f32; 4],
}

impl Default for ModelDefaults {
    fn default() -> Self {
        Self {
            scale: 1.0,
            position: Vector3::new(0.0, 0.0, 0.0),
            color: [0.8, 0.8, 0.8, 1.0],
        }
    }
}

/// Pending result of [`AssetLoader::load_model`].
///
/// Await it, or call [`ModelHandle::try_take`] from a frame loop. The result
/// is delivered exactly once.
pub struct ModelHandle {
    url: String,
    receiver: oneshot::Receiver<Result<Object, AssetError>>,
}

impl ModelHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Non-blocking poll; `None` while the loader is still working
    pub fn try_take(&mut self) -> Option<Result<Object, AssetError>> {
        match self.receiver.try_recv() {
            Ok(Some(result)) => Some(result),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(AssetError::Cancelled)),
        }
    }
}

impl Future for ModelHandle {
    type Output = Result<Object, AssetError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(AssetError::Cancelled)))
    }
}

pub struct AssetLoader {
    defaults: ModelDefaults,
}

impl AssetLoader {
    pub fn new(defaults: ModelDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &ModelDefaults {
        &self.defaults
    }

    /// Starts loading on a background thread and returns immediately
    pub fn load_model(&self, url: &str) -> ModelHandle {
        let (sender, receiver) = oneshot::channel();
        let source = AssetSource::parse(url);
        let defaults = self.defaults;
        info!("loading model from {}", url);

        let spawned = thread::Builder::new()
            .name("asset-loader".to_string())
            .spawn(move || {
                let result = Self::load_blocking(&source, &defaults);
                if let Err(err) = &result {
                    error!("model load failed: {}", err);
                }
                // The receiver may have been dropped if the context went away
                let _ = sender.send(result);
            });

        match spawned {
            Ok(_) => ModelHandle {
                url: url.to_string(),
                receiver,
            },
            Err(err) => {
                error!("could not start model loader: {}", err);
                let (sender, receiver) = oneshot::channel();
                let _ = sender.send(Err(AssetError::Spawn(err)));
                ModelHandle {
                    url: url.to_string(),
                    receiver,
                }
            }
        }
    }

    /// Fetches, decodes and wraps a model as a hidden scene object
    pub fn load_blocking(
        source: &AssetSource,
        defaults: &ModelDefaults,
    ) -> Result<Object, AssetError> {
        let format = ModelFormat::from_source(source)?;

        let decoded = match source {
            AssetSource::File(path) => decode_file(path, format)?,
            AssetSource::Http(url) => {
                let bytes = fetch(url)?;
                match format {
                    ModelFormat::Glb | ModelFormat::Gltf => gltf::load_slice(&bytes)?,
                    ModelFormat::Obj => obj::load_bytes(&bytes)?,
                }
            }
        };

        if decoded.meshes.iter().all(|mesh| mesh.triangle_count() == 0) {
            return Err(AssetError::EmptyModel);
        }

        let mut object = Object::new(source.stem(), decoded.meshes)
            .with_color(decoded.color.unwrap_or(defaults.color))
            .hidden();
        object.set_transform_trs(
            defaults.position,
            Quaternion::one(),
            Vector3::new(defaults.scale, defaults.scale, defaults.scale),
        );

        let stats = object.meshes.iter().map(|m| m.triangle_count()).sum::<u32>();
        info!(
            "loaded model '{}' ({} meshes, {} triangles)",
            object.name,
            object.meshes.len(),
            stats
        );
        Ok(object)
    }
}

fn decode_file(path: &Path, format: ModelFormat) -> Result<DecodedModel, AssetError> {
    if !path.exists() {
        return Err(AssetError::Io {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }
    match format {
        ModelFormat::Glb | ModelFormat::Gltf => gltf::load_path(path),
        ModelFormat::Obj => obj::load_path(path),
    }
}

fn fetch(url: &str) -> Result<Vec<u8>, AssetError> {
    let http_error = |source| AssetError::Http {
        url: url.to_string(),
        source,
    };

    let response = reqwest::blocking::get(url).map_err(http_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(AssetError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let bytes = response.bytes().map_err(http_error)?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE_OBJ: &str = "\
v -1 -1 -1
v 1 -1 -1
v 1 1 -1
v -1 1 -1
v -1 -1 1
v 1 -1 1
v 1 1 1
v -1 1 1
f 1 2 3 4
f 5 8 7 6
f 1 5 6 2
f 2 6 7 3
f 3 7 8 4
f 5 1 4 8
";

    fn write_model(name: &str, contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn source_parsing() {
        assert_eq!(
            AssetSource::parse("https://cdn.example.com/models/chair.glb?v=2"),
            AssetSource::Http("https://cdn.example.com/models/chair.glb?v=2".to_string())
        );
        assert_eq!(
            AssetSource::parse("file:///tmp/chair.obj"),
            AssetSource::File(PathBuf::from("/tmp/chair.obj"))
        );

        let remote = AssetSource::parse("https://cdn.example.com/models/chair.GLB?v=2#top");
        assert_eq!(remote.stem(), "chair");
        assert_eq!(remote.extension().as_deref(), Some("glb"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = AssetLoader::load_blocking(
            &AssetSource::parse("scene.fbx"),
            &ModelDefaults::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AssetError::UnsupportedFormat(ext) if ext == "fbx"));
    }

    #[test]
    fn loaded_model_is_hidden_with_defaults() {
        let (_dir, path) = write_model("crate.obj", CUBE_OBJ);
        let defaults = ModelDefaults {
            scale: 0.25,
            position: Vector3::new(0.0, -1.0, -2.0),
            color: [0.1, 0.2, 0.3, 1.0],
        };

        let object =
            AssetLoader::load_blocking(&AssetSource::File(path), &defaults).unwrap();

        assert_eq!(object.name, "crate");
        assert!(!object.visible);
        assert_eq!(object.position(), Vector3::new(0.0, -1.0, -2.0));
        assert_eq!(object.base_scale(), Vector3::new(0.25, 0.25, 0.25));
        assert_eq!(object.color, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(object.meshes[0].triangle_count(), 12);
    }

    #[test]
    fn handle_resolves_on_background_thread() {
        let (_dir, path) = write_model("crate.obj", CUBE_OBJ);
        let loader = AssetLoader::new(ModelDefaults::default());

        let handle = loader.load_model(path.to_str().unwrap());
        let object = pollster::block_on(handle).unwrap();

        assert_eq!(object.name, "crate");
    }

    #[test]
    fn missing_file_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(ModelDefaults::default());

        let handle = loader.load_model(dir.path().join("absent.glb").to_str().unwrap());

        let err = pollster::block_on(handle).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn try_take_is_non_blocking_until_ready() {
        let (sender, receiver) = oneshot::channel();
        let mut handle = ModelHandle {
            url: "model.glb".to_string(),
            receiver,
        };

        assert!(handle.try_take().is_none());
        sender.send(Err(AssetError::EmptyModel)).ok();
        assert!(matches!(handle.try_take(), Some(Err(AssetError::EmptyModel))));
    }

    #[test]
    fn dropped_loader_counts_as_cancelled() {
        let (sender, receiver) = oneshot::channel::<Result<Object, AssetError>>();
        let mut handle = ModelHandle {
            url: "model.glb".to_string(),
            receiver,
        };
        drop(sender);

        assert!(matches!(handle.try_take(), Some(Err(AssetError::Cancelled))));
    }
}
