use cgmath::Rad;
use winit::{
    event::{ElementState, KeyEvent, MouseButton},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::ar::simulated::ViewerRig;

/// Keyboard and mouse driver for the simulated viewer.
///
/// W/S or Up/Down walk, A/D strafe, Left/Right turn, Q/E tilt.
/// Dragging with the right mouse button looks around.
pub struct ViewerController {
    pub move_speed: f32,
    pub turn_speed: f32,
    pub look_sensitivity: f32,
    forward: f32,
    right: f32,
    turn: f32,
    tilt: f32,
    is_look_dragging: bool,
    pending_look: (f32, f32),
}

impl ViewerController {
    pub fn new(move_speed: f32, turn_speed: f32) -> Self {
        Self {
            move_speed,
            turn_speed,
            look_sensitivity: 0.004,
            forward: 0.0,
            right: 0.0,
            turn: 0.0,
            tilt: 0.0,
            is_look_dragging: false,
            pending_look: (0.0, 0.0),
        }
    }

    /// Returns true if the key was consumed
    pub fn process_keyboard_event(&mut self, event: &KeyEvent) -> bool {
        let PhysicalKey::Code(code) = event.physical_key else {
            return false;
        };
        let amount = if event.state == ElementState::Pressed { 1.0 } else { 0.0 };

        match code {
            KeyCode::KeyW | KeyCode::ArrowUp => self.forward = amount,
            KeyCode::KeyS | KeyCode::ArrowDown => self.forward = -amount,
            KeyCode::KeyD => self.right = amount,
            KeyCode::KeyA => self.right = -amount,
            KeyCode::ArrowLeft => self.turn = amount,
            KeyCode::ArrowRight => self.turn = -amount,
            KeyCode::KeyQ => self.tilt = amount,
            KeyCode::KeyE => self.tilt = -amount,
            _ => return false,
        }
        true
    }

    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Right {
            self.is_look_dragging = state == ElementState::Pressed;
        }
    }

    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) {
        if self.is_look_dragging {
            self.pending_look.0 -= delta.0 as f32 * self.look_sensitivity;
            self.pending_look.1 -= delta.1 as f32 * self.look_sensitivity;
        }
    }

    pub fn is_active(&self) -> bool {
        self.forward != 0.0
            || self.right != 0.0
            || self.turn != 0.0
            || self.tilt != 0.0
            || self.pending_look != (0.0, 0.0)
    }

    /// Applies held keys and accumulated mouse motion; returns true if the rig moved
    pub fn update(&mut self, dt: f32, rig: &mut ViewerRig) -> bool {
        if !self.is_active() {
            return false;
        }

        rig.walk(self.forward * self.move_speed * dt, self.right * self.move_speed * dt);
        let (look_yaw, look_pitch) = std::mem::take(&mut self.pending_look);
        rig.look(
            Rad(self.turn * self.turn_speed * dt + look_yaw),
            Rad(self.tilt * self.turn_speed * dt + look_pitch),
        );
        true
    }
}

impl Default for ViewerController {
    fn default() -> Self {
        Self::new(1.5, 1.2)
    }
}
