pub mod camera_utils;
pub mod perspective_camera;
pub mod viewer_controller;

// Re-export main types
pub use camera_utils::{Camera, CameraUniform};
pub use perspective_camera::PerspectiveCamera;
pub use viewer_controller::ViewerController;
