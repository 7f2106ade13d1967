// src/lib.rs
//! arplace
//!
//! Surface placement for augmented-reality scenes: a reticle follows the
//! first surface the device's hit test reports, and a select gesture drops a
//! loaded model onto it. Rendering uses wgpu; the tracking platform is a
//! trait with a simulated implementation for the desktop preview and tests.

pub mod app;
pub mod ar;
pub mod assets;
pub mod config;
pub mod gfx;
pub mod prelude;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::PreviewApp;
pub use ar::ArContext;
pub use config::ArConfig;
