//! The seam between the scene and whatever draws it.

use crate::gfx::scene::Scene;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("no compatible GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to open GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

/// Draws a [`Scene`] into a render target
pub trait Renderer {
    /// Resizes the render target; zero sizes are ignored by implementations
    fn resize(&mut self, width: u32, height: u32);

    /// Draws visible objects. May create GPU resources for new objects,
    /// which is the only mutation it performs on the scene.
    fn render(&mut self, scene: &mut Scene) -> Result<(), RenderError>;

    fn size(&self) -> (u32, u32);
}

/// What a [`HeadlessRenderer`] saw in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    pub visible: Vec<String>,
    pub view_proj: [[f32; 4]; 4],
}

/// Renderer without a GPU: records each frame for inspection
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    width: u32,
    height: u32,
    frames: Vec<RecordedFrame>,
    resizes: u32,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn frames_rendered(&self) -> usize {
        self.frames.len()
    }

    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }

    pub fn resize_count(&self) -> u32 {
        self.resizes
    }
}

impl Renderer for HeadlessRenderer {
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
        self.resizes += 1;
    }

    fn render(&mut self, scene: &mut Scene) -> Result<(), RenderError> {
        self.frames.push(RecordedFrame {
            visible: scene.visible_objects().map(|o| o.name.clone()).collect(),
            view_proj: scene.camera.uniform.view_proj,
        });
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
