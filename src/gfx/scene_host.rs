//! Owns the renderer and the scene it draws.
//!
//! Rendering is on demand: nothing is drawn unless [`SceneHost::render_frame`]
//! is called, which in an AR session happens once per platform frame.

use crate::ar::pose::Pose;
use crate::config::{ArConfig, ConfigError};
use crate::gfx::camera::PerspectiveCamera;
use crate::gfx::geometry::generate_ring;
use crate::gfx::rendering::{RenderError, Renderer};
use crate::gfx::scene::{Object, ObjectId, Scene};

/// Name of the reticle node in the scene
pub const RETICLE_NAME: &str = "reticle";

pub struct SceneHost<R: Renderer> {
    renderer: R,
    scene: Scene,
    reticle: ObjectId,
    width: u32,
    height: u32,
}

impl<R: Renderer> SceneHost<R> {
    /// Builds camera, light and the hidden reticle, then sizes the renderer
    pub fn initialize(
        config: &ArConfig,
        mut renderer: R,
        width: u32,
        height: u32,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let aspect = if height > 0 {
            width as f32 / height as f32
        } else {
            1.0
        };
        let camera = PerspectiveCamera::new(
            config.camera.fov,
            aspect,
            config.camera.near,
            config.camera.far,
        );

        let mut scene = Scene::new(camera, config.hemisphere_light()?);
        scene.clear_color = config.clear_color()?;

        let ring = generate_ring(
            config.reticle.inner_radius,
            config.reticle.outer_radius,
            config.reticle.segments,
        );
        let reticle = scene.add_object(
            Object::from_geometry(RETICLE_NAME, &ring)
                .with_color(config.reticle_color()?)
                .unlit()
                .hidden(),
        );

        renderer.resize(width, height);
        scene.update();
        log::info!(
            "scene initialized ({}x{}, fov {})",
            width,
            height,
            config.camera.fov
        );

        Ok(Self {
            renderer,
            scene,
            reticle,
            width,
            height,
        })
    }

    /// Ignores zero sizes so a minimized window keeps its last projection
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::debug!("ignoring resize to {}x{}", width, height);
            return;
        }
        self.width = width;
        self.height = height;
        self.scene.camera.resize_projection(width, height);
        self.renderer.resize(width, height);
    }

    pub fn render_frame(&mut self) -> Result<(), RenderError> {
        self.scene.update();
        self.renderer.render(&mut self.scene)
    }

    /// Moves the camera to a viewer pose expressed in scene coordinates
    pub fn set_camera_pose(&mut self, pose: &Pose) {
        self.scene.camera.set_view_pose(pose);
    }

    pub fn add_object(&mut self, object: Object) -> ObjectId {
        self.scene.add_object(object)
    }

    /// The reticle node cannot be removed
    pub fn remove_object(&mut self, id: ObjectId) -> Option<Object> {
        if id == self.reticle {
            log::warn!("refusing to remove the reticle node");
            return None;
        }
        self.scene.remove_object(id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.scene.object(id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.scene.object_mut(id)
    }

    pub fn reticle_id(&self) -> ObjectId {
        self.reticle
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
