//! In-memory controller backend.
//!
//! [`MockIo`] simulates a radio with a configurable number of Wii Remotes in
//! range. It is driven from the outside through a [`MockRadio`] handle, which
//! queues what each subsequent poll should report and records every native
//! call the pool makes.
//!
//! ```
//! use motelink::backends::mock::{MockIo, SimInput};
//! use motelink::event::raw;
//! use motelink::{DevicePool, PoolConfig};
//!
//! let (io, radio) = MockIo::new(4);
//! radio.place_in_range(1);
//! radio.queue_tick(vec![(0, SimInput::Event(raw::EVENT))]);
//!
//! let mut pool = DevicePool::new(io, PoolConfig::default()).unwrap();
//! pool.discover();
//! pool.connect();
//! let mut seen = Vec::new();
//! pool.tick(&mut |ev: &motelink::Event, _: &motelink::DeviceState| seen.push(ev.kind));
//! assert_eq!(seen, vec![motelink::EventKind::Generic]);
//! ```

use crate::backends::ControllerIo;
use crate::constants::Expansion;
use crate::device::{IrState, Orientation, SlotState};
use crate::error::{Error, Result};
use crate::event::{raw, EventKind};
use crate::metadata::DeviceMeta;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One simulated input applied to a slot during a poll.
#[derive(Clone, Debug, PartialEq)]
pub enum SimInput {
    /// Leave this raw code as the slot's transition. Disconnect codes also
    /// drop the slot's connection.
    Event(u8),
    Buttons { held: u16, pressed: u16 },
    Orientation(Orientation),
    Ir(IrState),
    ExpansionButtons(u16),
    Expansion(Expansion),
    /// The link goes away without the native layer reporting a code.
    SilentDrop,
}

/// Native calls observed by the mock.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallLog {
    pub find: usize,
    pub connect: usize,
    pub poll: usize,
    pub disconnect_all: usize,
    /// `(slot, mask)` for every LED command, including failed ones.
    pub leds: Vec<(usize, u8)>,
    pub rumble: Vec<(usize, bool)>,
    pub status_requests: Vec<usize>,
}

#[derive(Default)]
struct Radio {
    in_range: usize,
    frames: VecDeque<Vec<(usize, SimInput)>>,
    fail_leds: bool,
    calls: CallLog,
}

fn lock(shared: &Mutex<Radio>) -> MutexGuard<'_, Radio> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Control handle for a [`MockIo`]. Cheap to clone.
#[derive(Clone)]
pub struct MockRadio {
    shared: Arc<Mutex<Radio>>,
}

impl MockRadio {
    /// Put `count` more unconnected controllers in range.
    pub fn place_in_range(&self, count: usize) {
        lock(&self.shared).in_range += count;
    }

    /// Controllers in range and not yet connected.
    pub fn in_range(&self) -> usize {
        lock(&self.shared).in_range
    }

    /// Queue what the next poll reports. An empty frame makes that poll
    /// return `false`.
    pub fn queue_tick(&self, inputs: Vec<(usize, SimInput)>) {
        lock(&self.shared).frames.push_back(inputs);
    }

    /// Queue a single raw event for one slot.
    pub fn queue_event(&self, slot: usize, code: u8) {
        self.queue_tick(vec![(slot, SimInput::Event(code))]);
    }

    /// Queue the raw code that classifies as `kind` for one slot.
    pub fn queue_kind(&self, slot: usize, kind: EventKind) {
        self.queue_event(slot, kind.raw_code());
    }

    /// Queue a poll where nothing happens.
    pub fn queue_idle(&self) {
        self.queue_tick(Vec::new());
    }

    /// Frames not yet consumed by a poll.
    pub fn pending_ticks(&self) -> usize {
        lock(&self.shared).frames.len()
    }

    /// Make every following LED command fail.
    pub fn fail_leds(&self, fail: bool) {
        lock(&self.shared).fail_leds = fail;
    }

    pub fn calls(&self) -> CallLog {
        lock(&self.shared).calls.clone()
    }
}

/// Scripted [`ControllerIo`] implementation.
pub struct MockIo {
    slots: Vec<SlotState>,
    found: usize,
    shared: Arc<Mutex<Radio>>,
}

impl MockIo {
    /// Backend with `capacity` empty slots and its control handle.
    pub fn new(capacity: usize) -> (MockIo, MockRadio) {
        let shared = Arc::new(Mutex::new(Radio::default()));
        let io = MockIo {
            slots: vec![SlotState::default(); capacity],
            found: 0,
            shared: Arc::clone(&shared),
        };
        (io, MockRadio { shared })
    }

    fn connected_slot(&mut self, slot: usize) -> Result<&mut SlotState> {
        match self.slots.get_mut(slot) {
            Some(s) if s.connected => Ok(s),
            _ => Err(Error::Io(format!("slot {slot} is not connected"))),
        }
    }

    fn apply(state: &mut SlotState, input: SimInput) {
        match input {
            SimInput::Event(code) => {
                state.event = code;
                if code == raw::DISCONNECT || code == raw::UNEXPECTED_DISCONNECT {
                    state.connected = false;
                }
            }
            SimInput::Buttons { held, pressed } => {
                state.buttons = held;
                state.buttons_pressed = pressed;
            }
            SimInput::Orientation(o) => state.orientation = o,
            SimInput::Ir(ir) => state.ir = ir,
            SimInput::ExpansionButtons(b) => state.expansion_buttons = b,
            SimInput::Expansion(e) => state.expansion = e,
            SimInput::SilentDrop => {
                state.connected = false;
                state.event = raw::NONE;
            }
        }
    }
}

impl ControllerIo for MockIo {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn find(&mut self, max: usize, _timeout: Duration) -> usize {
        let mut radio = lock(&self.shared);
        radio.calls.find += 1;
        self.found = radio.in_range.min(max);
        self.found
    }

    fn connect(&mut self, max: usize) -> usize {
        let mut radio = lock(&self.shared);
        radio.calls.connect += 1;

        let max = max.min(self.slots.len());
        let mut pending = self.found;
        for state in self.slots[..max].iter_mut() {
            if pending == 0 {
                break;
            }
            if !state.connected {
                *state = SlotState::connected();
                pending -= 1;
                radio.in_range -= 1;
            }
        }
        self.found = 0;
        self.slots.iter().filter(|s| s.connected).count()
    }

    fn poll(&mut self, max: usize) -> bool {
        let mut radio = lock(&self.shared);
        radio.calls.poll += 1;

        for state in self.slots.iter_mut() {
            state.event = raw::NONE;
            state.buttons_pressed = 0;
        }

        let Some(frame) = radio.frames.pop_front() else {
            return false;
        };

        let mut touched = false;
        for (slot, input) in frame {
            if slot >= max {
                continue;
            }
            if let Some(state) = self.slots.get_mut(slot).filter(|s| s.connected) {
                Self::apply(state, input);
                touched = true;
            }
        }
        touched
    }

    fn slot(&self, slot: usize) -> Option<&SlotState> {
        self.slots.get(slot)
    }

    fn set_leds(&mut self, slot: usize, mask: u8) -> Result<()> {
        let mut radio = lock(&self.shared);
        radio.calls.leds.push((slot, mask));
        if radio.fail_leds {
            return Err(Error::Io(format!("led write to slot {slot} failed")));
        }
        drop(radio);
        self.connected_slot(slot).map(|_| ())
    }

    fn set_rumble(&mut self, slot: usize, on: bool) -> Result<()> {
        self.connected_slot(slot)?;
        lock(&self.shared).calls.rumble.push((slot, on));
        Ok(())
    }

    fn set_motion_sensing(&mut self, slot: usize, on: bool) -> Result<()> {
        self.connected_slot(slot)?.motion_sensing = on;
        Ok(())
    }

    fn set_ir_tracking(&mut self, slot: usize, on: bool) -> Result<()> {
        self.connected_slot(slot)?.ir_tracking = on;
        Ok(())
    }

    fn request_status(&mut self, slot: usize) -> Result<()> {
        self.connected_slot(slot)?;
        lock(&self.shared).calls.status_requests.push(slot);
        Ok(())
    }

    fn disconnect_all(&mut self, max: usize) {
        lock(&self.shared).calls.disconnect_all += 1;
        for state in self.slots.iter_mut().take(max) {
            *state = SlotState::default();
        }
        self.found = 0;
    }

    fn metadata(&self, slot: usize) -> DeviceMeta {
        DeviceMeta {
            product_string: Some("Simulated Wii Remote".into()),
            serial_number: Some(format!("mock-{slot}")),
            ..DeviceMeta::on_bus("mock")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Duration = Duration::from_secs(0);

    #[test]
    fn find_caps_at_max_and_is_repeatable() {
        let (mut io, radio) = MockIo::new(4);
        radio.place_in_range(6);
        assert_eq!(io.find(4, T), 4);
        assert_eq!(io.find(4, T), 4);
        assert_eq!(radio.calls().find, 2);
    }

    #[test]
    fn connect_fills_slots_in_order() {
        let (mut io, radio) = MockIo::new(4);
        radio.place_in_range(2);
        io.find(4, T);
        assert_eq!(io.connect(4), 2);
        assert!(io.slot(0).unwrap().connected);
        assert!(io.slot(1).unwrap().connected);
        assert!(!io.slot(2).unwrap().connected);
        assert_eq!(radio.in_range(), 0);
    }

    #[test]
    fn connect_without_find_connects_nothing() {
        let (mut io, radio) = MockIo::new(4);
        radio.place_in_range(2);
        assert_eq!(io.connect(4), 0);
    }

    #[test]
    fn poll_applies_one_frame_and_clears_codes() {
        let (mut io, radio) = MockIo::new(2);
        radio.place_in_range(1);
        io.find(2, T);
        io.connect(2);

        radio.queue_event(0, raw::STATUS);
        assert!(io.poll(2));
        assert_eq!(io.slot(0).unwrap().event, raw::STATUS);

        assert!(!io.poll(2));
        assert_eq!(io.slot(0).unwrap().event, raw::NONE);
    }

    #[test]
    fn inputs_for_empty_slots_are_ignored() {
        let (mut io, radio) = MockIo::new(2);
        radio.queue_event(1, raw::EVENT);
        assert!(!io.poll(2));
    }

    #[test]
    fn disconnect_code_drops_the_link() {
        let (mut io, radio) = MockIo::new(1);
        radio.place_in_range(1);
        io.find(1, T);
        io.connect(1);
        radio.queue_event(0, raw::UNEXPECTED_DISCONNECT);
        assert!(io.poll(1));
        assert!(!io.slot(0).unwrap().connected);
    }

    #[test]
    fn failing_leds_are_recorded() {
        let (mut io, radio) = MockIo::new(1);
        radio.place_in_range(1);
        io.find(1, T);
        io.connect(1);
        radio.fail_leds(true);
        assert!(io.set_leds(0, 0x10).is_err());
        assert_eq!(radio.calls().leds, vec![(0, 0x10)]);
    }

    #[test]
    fn commands_on_empty_slots_fail() {
        let (mut io, _radio) = MockIo::new(1);
        assert!(io.set_rumble(0, true).is_err());
        assert!(io.set_ir_tracking(5, true).is_err());
    }

    #[test]
    fn queued_kind_classifies_back() {
        let (mut io, radio) = MockIo::new(1);
        radio.place_in_range(1);
        io.find(1, T);
        io.connect(1);
        radio.queue_kind(0, EventKind::ClassicRemoved);
        assert!(io.poll(1));
        let code = io.slot(0).unwrap().event;
        assert_eq!(crate::event::classify(code).kind(), Some(EventKind::ClassicRemoved));
    }
}
