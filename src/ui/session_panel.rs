//! The on-screen AR button and status readout.

use std::sync::Arc;

use imgui::Condition;
use winit::event::WindowEvent;
use winit::window::{Window, WindowId};

use super::manager::UiManager;
use crate::ar::{ModelStatus, SessionState};

/// Request raised by the AR button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Start,
    Stop,
}

/// Snapshot of the AR context shown in the panel
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPanelState {
    pub supported: bool,
    pub session: SessionState,
    pub model: ModelStatus,
    pub placements: u32,
    pub notice: Option<String>,
}

impl Default for SessionPanelState {
    fn default() -> Self {
        Self {
            supported: true,
            session: SessionState::Idle,
            model: ModelStatus::NotRequested,
            placements: 0,
            notice: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionPanel {
    state: SessionPanelState,
    pending: Option<SessionCommand>,
}

impl SessionPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_state(&mut self, state: SessionPanelState) {
        self.state = state;
    }

    pub fn state(&self) -> &SessionPanelState {
        &self.state
    }

    pub fn button_label(&self) -> &'static str {
        if !self.state.supported {
            return "AR NOT SUPPORTED";
        }
        match self.state.session {
            SessionState::Active => "STOP AR",
            SessionState::Requesting => "STARTING AR...",
            SessionState::Idle | SessionState::Ended => "START AR",
        }
    }

    /// Command the button would raise right now, if it is enabled
    pub fn button_command(&self) -> Option<SessionCommand> {
        if !self.state.supported {
            return None;
        }
        match self.state.session {
            SessionState::Active => Some(SessionCommand::Stop),
            SessionState::Requesting => None,
            SessionState::Idle | SessionState::Ended => Some(SessionCommand::Start),
        }
    }

    pub fn press(&mut self) {
        if let Some(command) = self.button_command() {
            self.pending = Some(command);
        }
    }

    pub fn take_command(&mut self) -> Option<SessionCommand> {
        self.pending.take()
    }

    pub fn build(&mut self, ui: &imgui::Ui) {
        let [width, height] = ui.io().display_size;
        let label = self.button_label();
        let enabled = self.button_command().is_some();
        let mut pressed = false;

        ui.window("ar-session")
            .position([width * 0.5, height - 24.0], Condition::Always)
            .position_pivot([0.5, 1.0])
            .title_bar(false)
            .resizable(false)
            .movable(false)
            .always_auto_resize(true)
            .build(|| {
                let disabled = ui.begin_disabled(!enabled);
                if ui.button_with_size(label, [220.0, 44.0]) {
                    pressed = true;
                }
                disabled.end();

                ui.text(format!(
                    "model: {}  placed: {}",
                    self.state.model.label(),
                    self.state.placements
                ));
                if let Some(notice) = &self.state.notice {
                    ui.text_colored([1.0, 0.55, 0.4, 1.0], notice);
                }
            });

        if pressed {
            self.press();
        }
    }
}

/// imgui overlay drawn over the scene by the render engine
pub struct SessionOverlay {
    ui: UiManager,
    window: Arc<Window>,
    panel: SessionPanel,
}

impl SessionOverlay {
    pub fn new(ui: UiManager, window: Arc<Window>) -> Self {
        Self {
            ui,
            window,
            panel: SessionPanel::new(),
        }
    }

    pub fn panel(&self) -> &SessionPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut SessionPanel {
        &mut self.panel
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.ui.update_display_size(width, height);
    }

    pub fn wants_input(&self) -> bool {
        self.ui.wants_input()
    }

    /// Returns true if the panel consumed the event
    pub fn handle_input(&mut self, window_id: WindowId, event: &WindowEvent) -> bool {
        self.ui.handle_input(&self.window, window_id, event)
    }

    pub fn draw(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) {
        let Self { ui, window, panel } = self;
        ui.draw(device, queue, encoder, window, target, |frame| panel.build(frame));
    }
}
