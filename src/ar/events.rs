//! The single serialized input stream of the AR context.
//!
//! Frames and select gestures come from independent sources; pushing both
//! into one FIFO makes their interleaving explicit and replayable.

use std::collections::VecDeque;

use super::platform::{SessionHandle, XrFrame};
use crate::assets::AssetError;
use crate::gfx::scene::Object;

#[derive(Debug)]
pub enum ArEvent {
    /// Per-frame callback from the platform
    Frame(XrFrame),
    /// User tap/click
    Select,
    /// Platform-initiated (or echoed user-initiated) session end
    SessionEnded(SessionHandle),
    Resize { width: u32, height: u32 },
    ModelLoaded(Result<Object, AssetError>),
}

impl ArEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ArEvent::Frame(_) => "frame",
            ArEvent::Select => "select",
            ArEvent::SessionEnded(_) => "session-ended",
            ArEvent::Resize { .. } => "resize",
            ArEvent::ModelLoaded(_) => "model-loaded",
        }
    }
}

#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<ArEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ArEvent) {
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<ArEvent> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_come_out_in_push_order() {
        let mut queue = EventQueue::new();
        queue.push(ArEvent::Select);
        queue.push(ArEvent::Resize { width: 800, height: 600 });
        queue.push(ArEvent::SessionEnded(SessionHandle(3)));

        let names: Vec<_> = std::iter::from_fn(|| queue.pop()).map(|e| e.name()).collect();

        assert_eq!(names, ["select", "resize", "session-ended"]);
        assert!(queue.is_empty());
    }
}
