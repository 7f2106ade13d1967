//! Immediate-mode overlay: the AR session button and status text.

pub mod manager;
pub mod session_panel;

pub use manager::UiManager;
pub use session_panel::{SessionCommand, SessionOverlay, SessionPanel, SessionPanelState};
