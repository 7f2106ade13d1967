//! WGPU-based rendering engine
//!
//! Owns the surface, device and forward pipelines, and draws a [`Scene`]
//! followed by the optional session overlay.

use std::sync::Arc;

use wgpu::TextureFormat;
use winit::window::Window;

use super::renderer::{RenderError, Renderer};
use crate::gfx::{
    resources::{
        global_bindings::{object_bind_group_layout, GlobalBindings},
        texture_resource::TextureResource,
    },
    scene::{DrawObject, Object, Scene, Vertex3D},
};
use crate::ui::{SessionOverlay, UiManager};

/// Core rendering engine managing GPU resources and draw calls
///
/// Opaque objects are drawn first with depth writes; objects with alpha
/// below one are drawn afterwards without depth writes so they blend over
/// whatever lies on or behind them.
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    opaque_pipeline: wgpu::RenderPipeline,
    translucent_pipeline: wgpu::RenderPipeline,
    global_bindings: GlobalBindings,
    object_layout: wgpu::BindGroupLayout,
    overlay: Option<SessionOverlay>,
}

impl RenderEngine {
    /// Creates a render engine for the given window
    ///
    /// # Errors
    /// Fails if no adapter, device or surface format is available.
    pub async fn new(window: Arc<Window>, width: u32, height: u32) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or(RenderError::NoSurfaceFormat)?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");
        let global_bindings = GlobalBindings::new(&device);
        let object_layout = object_bind_group_layout(&device);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Forward Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Forward Pipeline Layout"),
            bind_group_layouts: &[global_bindings.layout(), &object_layout],
            push_constant_ranges: &[],
        });
        let opaque_pipeline = create_pipeline(&device, &pipeline_layout, &shader, format, false);
        let translucent_pipeline =
            create_pipeline(&device, &pipeline_layout, &shader, format, true);

        Ok(Self {
            surface,
            device: Arc::new(device),
            queue: Arc::new(queue),
            config,
            depth_texture,
            format,
            opaque_pipeline,
            translucent_pipeline,
            global_bindings,
            object_layout,
            overlay: None,
        })
    }

    /// Creates the imgui session overlay for `window`
    pub fn attach_overlay(&mut self, window: Arc<Window>) {
        let mut ui = UiManager::new(&self.device, &self.queue, self.format, &window);
        ui.update_display_size(self.config.width, self.config.height);
        self.overlay = Some(SessionOverlay::new(ui, window));
    }

    pub fn overlay(&self) -> Option<&SessionOverlay> {
        self.overlay.as_ref()
    }

    pub fn overlay_mut(&mut self) -> Option<&mut SessionOverlay> {
        self.overlay.as_mut()
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.format
    }

    fn prepare(&mut self, scene: &mut Scene) {
        for (_, object) in scene.objects_mut() {
            if !object.has_gpu_resources() {
                object.init_gpu_resources(&self.device, &self.object_layout);
            }
            object.update_transform(&self.queue);
        }
        self.global_bindings
            .update(&self.queue, &scene.camera.uniform, &scene.light);
    }

    fn acquire_frame(&mut self) -> Result<Option<wgpu::SurfaceTexture>, RenderError> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("timed out waiting for surface texture, skipping frame");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn is_translucent(object: &Object) -> bool {
    object.color[3] < 1.0
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: TextureFormat,
    translucent: bool,
) -> wgpu::RenderPipeline {
    let (label, blend, depth_write_enabled, depth_compare) = if translucent {
        (
            "Translucent",
            wgpu::BlendState::ALPHA_BLENDING,
            false,
            wgpu::CompareFunction::LessEqual,
        )
    } else {
        (
            "Opaque",
            wgpu::BlendState::REPLACE,
            true,
            wgpu::CompareFunction::Less,
        )
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex3D::desc()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Rings and planes are single-sided geometry seen from both sides
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: TextureResource::DEPTH_FORMAT,
            depth_write_enabled,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

impl Renderer for RenderEngine {
    /// Reconfigures the surface and recreates the depth texture
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");

        if let Some(overlay) = &mut self.overlay {
            overlay.resize(width, height);
        }
    }

    fn render(&mut self, scene: &mut Scene) -> Result<(), RenderError> {
        self.prepare(scene);

        let Some(surface_texture) = self.acquire_frame()? else {
            return Ok(());
        };
        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let [r, g, b, a] = scene.clear_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            render_pass.set_pipeline(&self.opaque_pipeline);
            for object in scene.visible_objects().filter(|o| !is_translucent(o)) {
                render_pass.draw_object(object);
            }

            render_pass.set_pipeline(&self.translucent_pipeline);
            for object in scene.visible_objects().filter(|o| is_translucent(o)) {
                render_pass.draw_object(object);
            }
        }

        if let Some(overlay) = &mut self.overlay {
            overlay.draw(&self.device, &self.queue, &mut encoder, &surface_texture_view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}
