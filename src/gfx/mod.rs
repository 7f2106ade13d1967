//! # Graphics Module
//!
//! Everything that turns the AR scene into pixels, plus the small amount of
//! geometry math the simulated platform shares with it.
//!
//! - **Camera** ([`camera`]) - perspective camera driven by the viewer pose
//! - **Geometry** ([`geometry`]) - reticle ring, planes, placeholder box
//! - **Picking** ([`picking`]) - rays and ray/plane intersection
//! - **Rendering** ([`rendering`]) - the [`Renderer`] trait, wgpu and headless backends
//! - **Scene** ([`scene`]) - objects, meshes and the hemisphere light
//! - **Scene host** ([`scene_host`]) - owns a renderer together with its scene
//!
//! ```no_run
//! use arplace::config::ArConfig;
//! use arplace::gfx::{rendering::HeadlessRenderer, SceneHost};
//!
//! let mut host = SceneHost::initialize(&ArConfig::default(), HeadlessRenderer::new(), 1280, 720)?;
//! host.render_frame()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod camera;
pub mod geometry;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod scene_host;

// Re-export commonly used types
pub use camera::PerspectiveCamera;
pub use rendering::{RenderEngine, Renderer};
pub use scene_host::SceneHost;
