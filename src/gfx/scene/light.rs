use cgmath::{InnerSpace, Vector3};

/// Sky/ground gradient light; surfaces facing `position` get the sky color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HemisphereLight {
    pub sky_color: [f32; 3],
    pub ground_color: [f32; 3],
    pub intensity: f32,
    pub position: Vector3<f32>,
}

impl HemisphereLight {
    pub fn new(sky_color: [f32; 3], ground_color: [f32; 3], intensity: f32) -> Self {
        Self {
            sky_color,
            ground_color,
            intensity,
            ..Default::default()
        }
    }

    /// Unit vector toward the sky side; falls back to +Y for a zero position
    pub fn direction(&self) -> Vector3<f32> {
        if self.position.magnitude2() > f32::EPSILON {
            self.position.normalize()
        } else {
            Vector3::unit_y()
        }
    }
}

impl Default for HemisphereLight {
    fn default() -> Self {
        Self {
            sky_color: [1.0, 1.0, 1.0],
            ground_color: [0xbb as f32 / 255.0, 0xbb as f32 / 255.0, 1.0],
            intensity: 1.0,
            position: Vector3::new(0.5, 1.0, 0.25),
        }
    }
}
