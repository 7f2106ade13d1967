use cgmath::*;

use super::camera_utils::{convert_matrix4_to_array, Camera, CameraUniform};
use crate::ar::pose::Pose;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Perspective camera whose view is driven by a tracked viewer pose.
#[derive(Debug, Clone, Copy)]
pub struct PerspectiveCamera {
    pub fovy: Deg<f32>,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
    view_pose: Pose,
    view: Matrix4<f32>,
    pub uniform: CameraUniform,
}

impl Camera for PerspectiveCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view
    }
}

impl PerspectiveCamera {
    pub fn new(fovy_degrees: f32, aspect: f32, znear: f32, zfar: f32) -> Self {
        let mut camera = Self {
            fovy: Deg(fovy_degrees),
            aspect,
            znear,
            zfar,
            view_pose: Pose::identity(),
            view: Matrix4::identity(),
            uniform: CameraUniform::default(),
        };
        camera.update();
        camera
    }

    /// Places the camera at a world-space pose (camera looks down the pose's -Z).
    ///
    /// Poses without an inverse are ignored and the previous view is kept.
    pub fn set_view_pose(&mut self, pose: &Pose) {
        match pose.inverse() {
            Some(inverse) => {
                self.view_pose = *pose;
                self.view = inverse.matrix();
            }
            None => log::warn!("ignoring degenerate camera pose"),
        }
    }

    pub fn view_pose(&self) -> &Pose {
        &self.view_pose
    }

    pub fn eye(&self) -> Vector3<f32> {
        self.view_pose.position()
    }

    /// Recomputes the aspect ratio; zero-sized targets leave it unchanged.
    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view
    }

    /// Refreshes the cached shader uniform from the current pose and projection
    pub fn update(&mut self) {
        let eye = self.eye();
        self.uniform.view_position = [eye.x, eye.y, eye.z, 1.0];
        self.uniform.view_proj = convert_matrix4_to_array(self.build_view_projection_matrix());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_updates_aspect() {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0);
        camera.resize_projection(1920, 1080);
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);

        camera.resize_projection(0, 1080);
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_view_pose_moves_eye_and_centers_forward_point() {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0);
        camera.set_view_pose(&Pose::from_position(Vector3::new(0.0, 1.6, 0.0)));
        camera.update();

        assert_eq!(camera.uniform.view_position, [0.0, 1.6, 0.0, 1.0]);

        // A point straight ahead projects to the center of clip space
        let ahead = camera.build_view_projection_matrix() * Vector4::new(0.0, 1.6, -5.0, 1.0);
        assert!((ahead.x / ahead.w).abs() < 1e-5);
        assert!((ahead.y / ahead.w).abs() < 1e-5);
        let depth = ahead.z / ahead.w;
        assert!(depth > 0.0 && depth < 1.0);
    }

    #[test]
    fn test_degenerate_pose_keeps_previous_view() {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0);
        camera.set_view_pose(&Pose::from_position(Vector3::new(1.0, 2.0, 3.0)));
        camera.set_view_pose(&Pose::from_matrix(Matrix4::zero()));

        assert_eq!(camera.eye(), Vector3::new(1.0, 2.0, 3.0));
    }
}
