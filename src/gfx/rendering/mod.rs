// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! The [`Renderer`] trait, a wgpu forward renderer for windows and a
//! headless recorder for tests.

pub mod render_engine;
pub mod renderer;

// Re-export main types
pub use render_engine::RenderEngine;
pub use renderer::{HeadlessRenderer, RecordedFrame, RenderError, Renderer};
