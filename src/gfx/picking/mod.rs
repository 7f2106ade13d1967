//! # Ray Casting
//!
//! Minimal ray primitives used for hit-testing against detected surfaces.
//!
//! ## Usage
//!
//! ```rust
//! use arplace::gfx::picking::Ray;
//! use cgmath::Vector3;
//!
//! let ray = Ray::new(Vector3::new(0.0, 1.6, 0.0), Vector3::new(0.0, -1.0, -1.0));
//! if let Some(t) = ray.intersect_plane(Vector3::new(0.0, 0.0, 0.0), Vector3::unit_y()) {
//!     println!("floor hit at {:?}", ray.point_at(t));
//! }
//! ```

use cgmath::{InnerSpace, Vector3};

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin point in world space
    pub origin: Vector3<f32>,
    /// Ray direction (normalized)
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Create a new ray
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }

    /// Distance to an infinite plane through `point` with `normal`.
    ///
    /// Returns None for planes parallel to the ray or behind its origin.
    pub fn intersect_plane(&self, point: Vector3<f32>, normal: Vector3<f32>) -> Option<f32> {
        let denom = normal.dot(self.direction);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (point - self.origin).dot(normal) / denom;
        (t >= 0.0).then_some(t)
    }
}
