use crate::device::DeviceState;
use crate::event::Event;
use crate::eventbus::EventListener;

/// Wraps a listener and filters events based on a user-supplied predicate.
pub struct FilteredListener {
    predicate: Box<dyn Fn(&Event, &DeviceState) -> bool>,
    inner: Box<dyn EventListener>,
}

impl FilteredListener {
    pub fn new(
        predicate: impl Fn(&Event, &DeviceState) -> bool + 'static,
        inner: impl EventListener + 'static,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            inner: Box::new(inner),
        }
    }
}

impl EventListener for FilteredListener {
    fn on_event(&mut self, event: &Event, state: &DeviceState) {
        if (self.predicate)(event, state) {
            self.inner.on_event(event, state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::buttons;
    use crate::device::{DeviceHandle, SlotState};
    use crate::event::EventKind;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Count(Rc<Cell<usize>>);

    impl EventListener for Count {
        fn on_event(&mut self, _: &Event, _: &DeviceState) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn predicate_sees_device_state() {
        let hits = Rc::new(Cell::new(0));
        let mut l = FilteredListener::new(
            |_, st| st.is_just_pressed(buttons::A),
            Count(hits.clone()),
        );

        let ev = Event::new(DeviceHandle::new(0, 0), EventKind::Generic);
        let mut sensors = SlotState::connected();
        l.on_event(&ev, &DeviceState::new(0, sensors.clone()));
        assert_eq!(hits.get(), 0);

        sensors.buttons = buttons::A;
        sensors.buttons_pressed = buttons::A;
        l.on_event(&ev, &DeviceState::new(0, sensors));
        assert_eq!(hits.get(), 1);
    }
}
