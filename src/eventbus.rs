use crate::device::{DeviceHandle, DeviceState};
use crate::event::Event;
use crate::poll_loop::EventSink;
use std::collections::BTreeMap;

/// Trait for reacting to classified events from any controller.
pub trait EventListener {
    fn on_event(&mut self, event: &Event, state: &DeviceState);
}

/// Determines which kinds of events a listener wants to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFilter {
    All,
    /// `connected`, `disconnected`, `unexpected_disconnect`.
    ConnectionOnly,
    /// Expansion inserted / removed.
    ExpansionOnly,
    Custom(fn(&Event) -> bool),
}

impl EventFilter {
    fn accepts(&self, event: &Event) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::ConnectionOnly => event.kind.is_connection_change(),
            EventFilter::ExpansionOnly => event.kind.is_expansion_change(),
            EventFilter::Custom(f) => f(event),
        }
    }
}

/// Metadata-wrapped listener with filters and control flags.
struct ListenerEntry {
    listener: Box<dyn EventListener>,
    enabled: bool,
    filter: EventFilter,
    device: Option<DeviceHandle>,
}

/// Sink that fans each event out to registered listeners, in registration
/// order.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: BTreeMap<u64, ListenerEntry>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener with a filter and an optional device tag.
    pub fn add_listener(
        &mut self,
        listener: impl EventListener + 'static,
        filter: EventFilter,
        device: Option<DeviceHandle>,
    ) -> u64 {
        let id = self.next_id;
        self.listeners.insert(
            id,
            ListenerEntry {
                listener: Box::new(listener),
                enabled: true,
                filter,
                device,
            },
        );
        self.next_id += 1;
        id
    }

    /// Enables a previously registered listener.
    pub fn enable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = true;
        }
    }

    /// Disables (mutes) a listener without removing it.
    pub fn disable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = false;
        }
    }

    /// Unregisters a listener entirely.
    pub fn remove_listener(&mut self, id: u64) {
        self.listeners.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Emits one event to all active and matching listeners.
    pub fn emit(&mut self, event: &Event, state: &DeviceState) {
        for entry in self.listeners.values_mut() {
            if !entry.enabled {
                continue;
            }

            // If tagged, only the tagged device's events pass
            if entry.device.is_some_and(|h| h != event.handle) {
                continue;
            }

            if entry.filter.accepts(event) {
                entry.listener.on_event(event, state);
            }
        }
    }
}

impl EventSink for EventBus {
    fn dispatch(&mut self, event: &Event, state: &DeviceState) {
        self.emit(event, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::SlotState;
    use crate::event::EventKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Seen = Rc<RefCell<Vec<(u64, EventKind)>>>;

    struct Recorder {
        id: u64,
        seen: Seen,
    }

    impl EventListener for Recorder {
        fn on_event(&mut self, event: &Event, _state: &DeviceState) {
            self.seen.borrow_mut().push((self.id, event.kind));
        }
    }

    fn state() -> DeviceState {
        DeviceState::new(0, SlotState::connected())
    }

    fn ev(index: u32, kind: EventKind) -> Event {
        Event::new(DeviceHandle::new(index, 0), kind)
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let seen = Seen::default();
        let mut bus = EventBus::new();
        for id in 0..3 {
            bus.add_listener(
                Recorder {
                    id,
                    seen: seen.clone(),
                },
                EventFilter::All,
                None,
            );
        }
        bus.dispatch(&ev(0, EventKind::Generic), &state());
        let ids: Vec<u64> = seen.borrow().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn filters_and_tags() {
        let seen = Seen::default();
        let mut bus = EventBus::new();
        bus.add_listener(
            Recorder {
                id: 0,
                seen: seen.clone(),
            },
            EventFilter::ConnectionOnly,
            None,
        );
        bus.add_listener(
            Recorder {
                id: 1,
                seen: seen.clone(),
            },
            EventFilter::ExpansionOnly,
            None,
        );
        bus.add_listener(
            Recorder {
                id: 2,
                seen: seen.clone(),
            },
            EventFilter::All,
            Some(DeviceHandle::new(1, 0)),
        );

        let st = state();
        bus.emit(&ev(0, EventKind::Generic), &st);
        bus.emit(&ev(0, EventKind::UnexpectedDisconnect), &st);
        bus.emit(&ev(0, EventKind::NunchukInserted), &st);
        bus.emit(&ev(1, EventKind::Status), &st);

        assert_eq!(
            *seen.borrow(),
            vec![
                (0, EventKind::UnexpectedDisconnect),
                (1, EventKind::NunchukInserted),
                (2, EventKind::Status),
            ]
        );
    }

    #[test]
    fn custom_filter_disable_and_remove() {
        fn only_status(e: &Event) -> bool {
            e.kind == EventKind::Status
        }

        let seen = Seen::default();
        let mut bus = EventBus::new();
        let id = bus.add_listener(
            Recorder {
                id: 7,
                seen: seen.clone(),
            },
            EventFilter::Custom(only_status),
            None,
        );
        let st = state();

        bus.emit(&ev(0, EventKind::Generic), &st);
        bus.emit(&ev(0, EventKind::Status), &st);
        assert_eq!(seen.borrow().len(), 1);

        bus.disable(id);
        bus.emit(&ev(0, EventKind::Status), &st);
        assert_eq!(seen.borrow().len(), 1);

        bus.enable(id);
        bus.emit(&ev(0, EventKind::Status), &st);
        assert_eq!(seen.borrow().len(), 2);

        bus.remove_listener(id);
        assert!(bus.is_empty());
    }
}
