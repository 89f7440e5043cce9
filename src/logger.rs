use crate::device::DeviceState;
use crate::event::Event;
use crate::eventbus::EventListener;

/// A simple listener that records every event through `tracing` at `info`.
#[derive(Default)]
pub struct LogListener;

impl LogListener {
    pub fn new() -> Self {
        LogListener
    }
}

impl EventListener for LogListener {
    fn on_event(&mut self, event: &Event, state: &DeviceState) {
        tracing::info!(
            handle = %event.handle,
            kind = %event.kind,
            connected = state.is_connected(),
            indicator = ?state.indicator(),
            "controller event"
        );
    }
}
