//! The device pool.
//!
//! [`DevicePool`] owns a [`ControllerIo`] backend and a fixed array of slots.
//! It discovers and connects controllers, hands out generation-checked
//! [`DeviceHandle`]s in connection order, refreshes their cached state once
//! per poll and releases everything on [`cleanup_all`](DevicePool::cleanup_all)
//! (or drop).
//!
//! ## Handle lifetime
//! - A handle is created when its controller connects.
//! - When a poll reports the controller gone, the handle stays readable
//!   (`is_connected() == false`) until the next poll, then it is released.
//! - `cleanup_all` releases every handle at once.
//!
//! Released handles never resolve again; [`get`](DevicePool::get) returns
//! [`Error::StaleHandle`].

use crate::backends::ControllerIo;
use crate::config::PoolConfig;
use crate::device::{DeviceHandle, DeviceState};
use crate::error::{Error, Result};
use crate::event::{classify, Event, EventKind, Transition};
use crate::indicator::{self, Indicator};
use crate::metadata::DeviceMeta;
use crate::poll_loop::EventSink;
use crate::snapshot::Snapshot;
use std::time::Duration;
use tracing::{debug, info, warn};

struct Entry {
    generation: u32,
    state: Option<DeviceState>,
    /// Disconnect reported by the last poll; release on the next one.
    retiring: bool,
}

impl Entry {
    fn release(&mut self) {
        if self.state.take().is_some() {
            self.generation = self.generation.wrapping_add(1);
        }
        self.retiring = false;
    }
}

/// Bounded pool of connected controllers.
pub struct DevicePool<I: ControllerIo> {
    io: I,
    config: PoolConfig,
    entries: Vec<Entry>,
    /// Live handles in connection order.
    order: Vec<DeviceHandle>,
    last_found: usize,
    /// Native connections may exist and need `disconnect_all`.
    session_open: bool,
}

impl<I: ControllerIo> DevicePool<I> {
    /// Create a pool over `io`. Fails if the configured capacity is zero or
    /// larger than the backend's slot count.
    pub fn new(io: I, config: PoolConfig) -> Result<Self> {
        config.validate()?;
        if config.capacity > io.capacity() {
            return Err(Error::Config(format!(
                "capacity {} exceeds backend slots ({})",
                config.capacity,
                io.capacity()
            )));
        }
        let entries = (0..config.capacity)
            .map(|_| Entry {
                generation: 0,
                state: None,
                retiring: false,
            })
            .collect();
        Ok(Self {
            io,
            config,
            entries,
            order: Vec::new(),
            last_found: 0,
            session_open: false,
        })
    }

    #[inline]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Count reported by the most recent discovery.
    #[inline]
    pub fn discovered(&self) -> usize {
        self.last_found
    }

    /// Scan for unconnected controllers using the configured timeout.
    pub fn discover(&mut self) -> usize {
        self.discover_with(self.config.capacity, self.config.discovery_timeout())
    }

    /// Scan for up to `max` (capped at capacity) unconnected controllers.
    ///
    /// Never connects anything and may be repeated. Finding nothing is not an
    /// error.
    pub fn discover_with(&mut self, max: usize, timeout: Duration) -> usize {
        let max = max.min(self.config.capacity);
        let found = self.io.find(max, timeout);
        self.last_found = found;
        debug!(found, max, ?timeout, "discovery finished");
        found
    }

    /// Connect everything the last discovery found.
    ///
    /// Returns the number of live connected controllers (cumulative). Does
    /// nothing and returns `0` if the last discovery found nothing.
    pub fn connect(&mut self) -> usize {
        if self.last_found == 0 {
            debug!("connect skipped: nothing discovered");
            return 0;
        }
        self.release_retired();
        self.session_open = true;

        let native = self.io.connect(self.config.capacity);
        debug!(native, "native connect returned");

        for index in 0..self.config.capacity {
            let sensors = match self.io.slot(index) {
                Some(slot) if slot.connected && self.entries[index].state.is_none() => {
                    slot.clone()
                }
                _ => continue,
            };

            let handle = DeviceHandle::new(index as u32, self.entries[index].generation);
            let mut state = DeviceState::new(index, sensors);

            match self.next_indicator() {
                Some(ind) => {
                    state.indicator = Some(ind);
                    if indicator::assign(&mut self.io, index, ind) {
                        state.leds = ind.mask();
                    }
                }
                None => debug!(%handle, "all indicators taken"),
            }

            info!(%handle, indicator = ?state.indicator, "controller connected");
            self.entries[index].state = Some(state);
            self.order.push(handle);
        }

        self.connected()
    }

    fn next_indicator(&self) -> Option<Indicator> {
        Indicator::next_free(
            self.states()
                .filter(|st| st.connected)
                .filter_map(|st| st.indicator),
        )
    }

    /// One non-blocking read cycle.
    ///
    /// Returns `false` if nothing happened (or nothing is connected); every
    /// pending event is cleared in that case. On `true` every handle's cached
    /// state has been refreshed.
    pub fn poll(&mut self) -> bool {
        self.release_retired();
        if self.order.is_empty() {
            return false;
        }

        if !self.io.poll(self.config.capacity) {
            for entry in self.entries.iter_mut() {
                if let Some(st) = entry.state.as_mut() {
                    st.pending = None;
                }
            }
            return false;
        }

        let Self {
            io, entries, order, ..
        } = self;

        for handle in order.iter() {
            let entry = &mut entries[handle.index()];
            let (Some(state), Some(slot)) = (entry.state.as_mut(), io.slot(handle.index()))
            else {
                continue;
            };

            state.sensors = slot.clone();
            state.pending = match classify(slot.event) {
                Transition::Idle => None,
                Transition::Kind(kind) => Some(kind),
                Transition::Unrecognized(code) => {
                    warn!(%handle, code, "unrecognized transition code");
                    None
                }
            };

            let reported = state.pending.is_some_and(EventKind::is_disconnect);
            if reported || !slot.connected {
                if !reported {
                    warn!(%handle, "link dropped without a disconnect code");
                    state.pending = Some(EventKind::UnexpectedDisconnect);
                }
                state.connected = false;
                entry.retiring = true;
                info!(%handle, kind = ?state.pending, "controller disconnected");
            }
        }
        true
    }

    /// Poll once and dispatch every pending event, in connection order.
    ///
    /// Returns the number of events dispatched.
    pub fn tick<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> usize {
        if !self.poll() {
            return 0;
        }
        let mut dispatched = 0;
        for handle in &self.order {
            let Some(state) = self.entries[handle.index()].state.as_ref() else {
                continue;
            };
            if let Some(kind) = state.pending {
                sink.dispatch(&Event::new(*handle, kind), state);
                dispatched += 1;
            }
        }
        dispatched
    }

    fn release_retired(&mut self) {
        let entries = &mut self.entries;
        self.order.retain(|h| {
            let entry = &mut entries[h.index()];
            if entry.retiring {
                entry.release();
                debug!(handle = %h, "handle released");
                false
            } else {
                true
            }
        });
    }

    /// Disconnect every controller and release all handles.
    ///
    /// Safe to call repeatedly; a second call does no native work.
    pub fn cleanup_all(&mut self) {
        self.last_found = 0;
        if !self.session_open && self.order.is_empty() {
            return;
        }
        self.io.disconnect_all(self.config.capacity);
        for entry in self.entries.iter_mut() {
            entry.release();
        }
        let released = self.order.len();
        self.order.clear();
        self.session_open = false;
        info!(released, "pool cleaned up");
    }

    /// Number of connected controllers.
    pub fn connected(&self) -> usize {
        self.states().filter(|st| st.connected).count()
    }

    /// Live handles in connection order.
    #[inline]
    pub fn handles(&self) -> &[DeviceHandle] {
        &self.order
    }

    /// Whether `handle` still resolves.
    pub fn contains(&self, handle: DeviceHandle) -> bool {
        self.get(handle).is_ok()
    }

    /// Cached state of `handle`.
    pub fn get(&self, handle: DeviceHandle) -> Result<&DeviceState> {
        self.entries
            .get(handle.index())
            .filter(|e| e.generation == handle.generation())
            .and_then(|e| e.state.as_ref())
            .ok_or(Error::StaleHandle(handle))
    }

    /// Resolve `handle` to a connected device, returning its slot.
    fn live_slot(&self, handle: DeviceHandle) -> Result<usize> {
        match self.get(handle) {
            Ok(st) if st.connected => Ok(st.slot),
            _ => Err(Error::StaleHandle(handle)),
        }
    }

    fn state_mut(&mut self, handle: DeviceHandle) -> Result<&mut DeviceState> {
        self.entries
            .get_mut(handle.index())
            .filter(|e| e.generation == handle.generation())
            .and_then(|e| e.state.as_mut())
            .ok_or(Error::StaleHandle(handle))
    }

    fn states(&self) -> impl Iterator<Item = &DeviceState> {
        self.order
            .iter()
            .filter_map(|h| self.entries[h.index()].state.as_ref())
    }

    /// Handles and states in connection order.
    pub fn iter(&self) -> impl Iterator<Item = (DeviceHandle, &DeviceState)> {
        self.order
            .iter()
            .filter_map(|h| self.entries[h.index()].state.as_ref().map(|st| (*h, st)))
    }

    /// IR cursor of every handle in connection order (`None` while IR is off).
    pub fn positions(&self) -> Vec<Option<(i32, i32)>> {
        self.states().map(DeviceState::ir_cursor).collect()
    }

    /// Owned copy of every handle's state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.iter().map(|(h, st)| (h, st.clone())).collect())
    }

    pub fn metadata(&self, handle: DeviceHandle) -> Result<DeviceMeta> {
        let slot = self.get(handle)?.slot;
        Ok(self.io.metadata(slot))
    }

    pub fn set_rumble(&mut self, handle: DeviceHandle, on: bool) -> Result<()> {
        let slot = self.live_slot(handle)?;
        self.io.set_rumble(slot, on)?;
        self.state_mut(handle)?.rumble = on;
        Ok(())
    }

    /// Light an arbitrary LED mask (see [`constants::leds`](crate::constants::leds)).
    pub fn set_leds(&mut self, handle: DeviceHandle, mask: u8) -> Result<()> {
        let slot = self.live_slot(handle)?;
        self.io.set_leds(slot, mask)?;
        self.state_mut(handle)?.leds = mask;
        Ok(())
    }

    pub fn turn_off_leds(&mut self, handle: DeviceHandle) -> Result<()> {
        self.set_leds(handle, crate::constants::leds::NONE)
    }

    pub fn set_motion_sensing(&mut self, handle: DeviceHandle, on: bool) -> Result<()> {
        let slot = self.live_slot(handle)?;
        self.io.set_motion_sensing(slot, on)?;
        self.sync_capabilities(handle, slot)
    }

    pub fn set_ir_tracking(&mut self, handle: DeviceHandle, on: bool) -> Result<()> {
        let slot = self.live_slot(handle)?;
        self.io.set_ir_tracking(slot, on)?;
        self.sync_capabilities(handle, slot)
    }

    /// Request a status report; it arrives as a later `status` event.
    pub fn request_status(&mut self, handle: DeviceHandle) -> Result<()> {
        let slot = self.live_slot(handle)?;
        self.io.request_status(slot)
    }

    fn sync_capabilities(&mut self, handle: DeviceHandle, slot: usize) -> Result<()> {
        let (motion, ir) = match self.io.slot(slot) {
            Some(s) => (s.motion_sensing, s.ir_tracking),
            None => return Err(Error::StaleHandle(handle)),
        };
        let st = self.state_mut(handle)?;
        st.sensors.motion_sensing = motion;
        st.sensors.ir_tracking = ir;
        Ok(())
    }
}

impl<I: ControllerIo> Drop for DevicePool<I> {
    fn drop(&mut self) {
        self.cleanup_all();
    }
}
