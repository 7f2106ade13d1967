//! Desktop preview: a simulated AR session in a window.
//!
//! Enter starts a session and Escape ends it (or quits when none is running).
//! W/A/S/D and the arrow keys move the simulated device, right-drag looks
//! around, left click is the select gesture and T simulates lost tracking.

use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    error::EventLoopError,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::ar::{ArContext, ArEvent, Pose, SessionState, SimulatedPlatform, SurfaceRect};
use crate::config::ArConfig;
use crate::gfx::{
    camera::ViewerController,
    geometry::{generate_box, generate_plane},
    rendering::RenderEngine,
    scene::Object,
};
use crate::ui::{SessionCommand, SessionPanelState};

const SURFACE_COLOR: [f32; 4] = [0.45, 0.7, 1.0, 0.22];

type PreviewContext = ArContext<SimulatedPlatform, RenderEngine>;

pub struct PreviewApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: ArConfig,
    window: Option<Arc<Window>>,
    context: Option<PreviewContext>,
    controller: ViewerController,
    last_update: Instant,
}

impl PreviewApp {
    /// Loads `config.model.url`, or a placeholder box when the url is empty
    pub fn new(config: ArConfig) -> Result<Self, EventLoopError> {
        let event_loop = EventLoop::new()?;
        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                context: None,
                controller: ViewerController::default(),
                last_update: Instant::now(),
            },
        })
    }

    /// Run the application (consumes self and starts the event loop)
    pub fn run(mut self) -> Result<(), EventLoopError> {
        let Some(event_loop) = self.event_loop.take() else {
            return Ok(());
        };
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.app_state)
    }
}

/// Translucent plane covering `surface`, expressed relative to the `local` origin
pub(crate) fn surface_visual(surface: &SurfaceRect, local_origin: &Pose) -> Object {
    let mut object = Object::from_geometry(
        format!("surface-{}", surface.name),
        &generate_plane(1.0, 1.0, 1, 1),
    )
    .with_color(SURFACE_COLOR);
    let world = Pose::from_matrix(surface.visual_transform());
    object.transform = world
        .relative_to(local_origin)
        .unwrap_or(world)
        .matrix();
    object
}

impl AppState {
    fn create_context(&mut self, window: Arc<Window>) -> Option<PreviewContext> {
        let (width, height) = window.inner_size().into();

        let mut engine = match pollster::block_on(RenderEngine::new(window.clone(), width, height)) {
            Ok(engine) => engine,
            Err(err) => {
                log::error!("could not create renderer: {}", err);
                return None;
            }
        };
        engine.attach_overlay(window);

        let platform = SimulatedPlatform::preview_room();
        let mut context =
            match ArContext::new(&self.config, platform, engine, width, height) {
                Ok(context) => context,
                Err(err) => {
                    log::error!("invalid configuration: {}", err);
                    return None;
                }
            };

        let origin = context.platform().local_origin();
        let visuals: Vec<Object> = context
            .platform()
            .surfaces()
            .iter()
            .map(|surface| surface_visual(surface, &origin))
            .collect();
        for visual in visuals {
            context.host_mut().add_object(visual);
        }

        if self.config.model.url.is_empty() {
            let color = context.model_defaults().color;
            context.install_model(
                Object::from_geometry("placeholder", &generate_box(0.25, 0.25, 0.25))
                    .with_color(color)
                    .hidden(),
            );
        } else {
            context.load_model(&self.config.model.url);
        }

        Some(context)
    }

    fn handle_command(context: &mut PreviewContext, command: SessionCommand) {
        match command {
            SessionCommand::Start => {
                if let Err(err) = pollster::block_on(context.start_session()) {
                    log::debug!("start request ended with: {}", err);
                }
            }
            SessionCommand::Stop => {
                context.end_session();
            }
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        let Some(context) = self.context.as_mut() else {
            return;
        };
        if self.controller.process_keyboard_event(event)
            || event.state != ElementState::Pressed
            || event.repeat
        {
            return;
        }

        match event.physical_key {
            PhysicalKey::Code(KeyCode::Enter) => {
                Self::handle_command(context, SessionCommand::Start);
            }
            PhysicalKey::Code(KeyCode::Escape) => {
                if context.session_state() == SessionState::Active {
                    Self::handle_command(context, SessionCommand::Stop);
                } else {
                    event_loop.exit();
                }
            }
            PhysicalKey::Code(KeyCode::KeyT) => {
                if let Some(ended) = context.platform().force_end() {
                    context.push_event(ArEvent::SessionEnded(ended));
                }
            }
            _ => {}
        }
    }

    fn tick(&mut self) {
        let Some(context) = self.context.as_mut() else {
            return;
        };

        let now = Instant::now();
        let dt = (now - self.last_update).as_secs_f32();
        self.last_update = now;

        let controller = &mut self.controller;
        context
            .platform()
            .update_viewer(|rig| {
                controller.update(dt, rig);
            });

        let command = context
            .host_mut()
            .renderer_mut()
            .overlay_mut()
            .and_then(|overlay| overlay.panel_mut().take_command());
        if let Some(command) = command {
            Self::handle_command(context, command);
        }

        let in_session = context.session_state() == SessionState::Active;
        if in_session {
            if let Some(frame) = context.platform().next_frame() {
                context.push_event(ArEvent::Frame(frame));
            }
        }
        context.pump();

        let panel_state = SessionPanelState {
            supported: context.is_supported(),
            session: context.session_state(),
            model: context.model_status(),
            placements: context.placements(),
            notice: context.notice().map(str::to_string),
        };
        if let Some(overlay) = context.host_mut().renderer_mut().overlay_mut() {
            overlay.panel_mut().set_state(panel_state);
        }

        // Outside a session nothing drives the frame loop, so draw directly
        if !in_session {
            let pose = context.platform().viewer_pose_local();
            context.host_mut().set_camera_pose(&pose);
            if let Err(err) = context.render() {
                log::error!("preview frame failed: {}", err);
            }
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title("arplace preview")
            .with_inner_size(winit::dpi::LogicalSize::new(1200, 800));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("could not create window: {}", err);
                event_loop.exit();
                return;
            }
        };

        match self.create_context(window.clone()) {
            Some(context) => {
                self.context = Some(context);
                self.window = Some(window);
                self.last_update = Instant::now();
                log::info!("press Enter to start the AR session");
            }
            None => event_loop.exit(),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(context) = self.context.as_mut() else {
            return;
        };

        // Handle UI input first
        let captured = context
            .host_mut()
            .renderer_mut()
            .overlay_mut()
            .is_some_and(|overlay| overlay.handle_input(window_id, &event));
        if captured {
            return;
        }

        match event {
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),
            WindowEvent::MouseInput { state, button, .. } => {
                self.controller.process_mouse_button(button, state);
                if button == MouseButton::Left
                    && state == ElementState::Pressed
                    && context.session_state() == SessionState::Active
                {
                    context.push_event(ArEvent::Select);
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                context.push_event(ArEvent::Resize { width, height });
            }
            WindowEvent::CloseRequested => {
                context.end_session();
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => self.tick(),
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let wants_input = self
            .context
            .as_mut()
            .and_then(|context| context.host_mut().renderer_mut().overlay_mut())
            .is_some_and(|overlay| overlay.wants_input());
        if wants_input {
            return;
        }

        if let DeviceEvent::MouseMotion { delta } = event {
            self.controller.process_mouse_motion(delta);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
