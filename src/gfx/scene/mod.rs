//! # Scene Management Module
//!
//! Objects, camera and lighting for a rendered frame.
//!
//! ## Key Components
//!
//! - [`Scene`] - Slot-based object store plus camera and hemisphere light
//! - [`Object`] - Named node with meshes, transform, color and visibility
//! - [`Vertex3D`] - Interleaved position/normal vertex
//!
//! ## Usage
//!
//! ```rust
//! use arplace::gfx::camera::PerspectiveCamera;
//! use arplace::gfx::geometry::generate_ring;
//! use arplace::gfx::scene::{HemisphereLight, Object, Scene};
//!
//! let camera = PerspectiveCamera::new(75.0, 16.0 / 9.0, 0.1, 1000.0);
//! let mut scene = Scene::new(camera, HemisphereLight::default());
//!
//! let reticle = scene.add_object(Object::from_geometry("reticle", &generate_ring(0.05, 0.06, 32)).hidden());
//! assert!(!scene.object(reticle).unwrap().visible);
//! ```

pub mod light;
pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use light::HemisphereLight;
pub use object::{DrawObject, Mesh, Object, ObjectId};
pub use scene::{Scene, SceneStats};
pub use vertex::Vertex3D;
