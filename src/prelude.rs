//! # arplace Prelude
//!
//! Commonly used types in one import.
//!
//! ```no_run
//! use arplace::prelude::*;
//!
//! let config = ArConfig::default();
//! let mut ctx = ArContext::new(
//!     &config,
//!     SimulatedPlatform::preview_room(),
//!     HeadlessRenderer::new(),
//!     1280,
//!     720,
//! )?;
//! ctx.load_model(&config.model.url);
//! pollster::block_on(ctx.start_session())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Application
pub use crate::app::PreviewApp;
pub use crate::config::ArConfig;

// AR core
pub use crate::ar::{
    ArContext, ArEvent, HitTestReticle, ModelStatus, OrientationMode, PlacementOutcome, Pose,
    ReticleUpdate, SessionError, SessionState, SimulatedPlatform, SurfaceRect, ViewerRig,
    XrFrame, XrPlatform,
};

// Assets
pub use crate::assets::{AssetError, AssetLoader, ModelDefaults, ModelHandle};

// Graphics
pub use crate::gfx::geometry::{generate_box, generate_plane, generate_ring, GeometryData};
pub use crate::gfx::rendering::{HeadlessRenderer, RenderEngine, RenderError, Renderer};
pub use crate::gfx::scene::{Object, ObjectId, Scene};
pub use crate::gfx::SceneHost;

// Math types
pub use cgmath::{Deg, Matrix4, Quaternion, Rad, Vector3};
