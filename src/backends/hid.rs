//! Wii Remotes over the OS Bluetooth HID stack, read with `hidapi`.
//!
//! The remotes must already be paired with the host; `find` scans the HID
//! device list for Nintendo remotes rather than running a radio inquiry.
//! Expansion buttons are not decoded by this backend (the slot's
//! `expansion` is identified, `expansion_buttons` stays `0`).

use crate::backends::report;
use crate::backends::tracker::{RemoteTracker, ReportWriter};
use crate::backends::ControllerIo;
use crate::device::SlotState;
use crate::error::{Error, Result};
use crate::metadata::DeviceMeta;
use hidapi::{DeviceInfo, HidApi, HidDevice};
use std::time::{Duration, Instant};

/// Upper bound on reports drained from one remote per poll.
pub const MAX_REPORTS_PER_TICK: usize = 32;

const SCAN_INTERVAL: Duration = Duration::from_millis(250);

impl ReportWriter for HidDevice {
    fn write_report(&mut self, data: &[u8]) -> Result<()> {
        self.write(data)?;
        Ok(())
    }
}

struct Remote {
    device: HidDevice,
    path: String,
    meta: DeviceMeta,
    tracker: RemoteTracker,
}

impl Remote {
    fn open(api: &HidApi, info: &DeviceInfo) -> Result<Self> {
        let device = info.open_device(api)?;
        device.set_blocking_mode(false)?;
        let path = info.path().to_string_lossy().into_owned();
        Ok(Self {
            device,
            meta: DeviceMeta {
                bus: Some("bluetooth".to_string()),
                vid: Some(info.vendor_id()),
                pid: Some(info.product_id()),
                product_string: info.product_string().map(str::to_string),
                serial_number: info.serial_number().map(str::to_string),
                path: Some(path.clone()),
            },
            path,
            tracker: RemoteTracker::new(),
        })
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        self.device.write_report(data)
    }

    fn send_all(&mut self, reports: &[Vec<u8>]) -> Result<()> {
        reports.iter().try_for_each(|r| self.send(r))
    }

    fn send_mode(&mut self, state: &SlotState) -> Result<()> {
        let mode = report::mode_for(state.motion_sensing, state.ir_tracking);
        let rumble = self.tracker.rumble();
        self.send(&report::report_mode(mode, rumble))
    }

    /// Drain pending reports into `state`. Only read errors are returned.
    fn drain(&mut self, state: &mut SlotState) -> Result<bool> {
        let mut buf = [0u8; report::MAX_REPORT_LEN];
        let mut changed = false;
        for _ in 0..MAX_REPORTS_PER_TICK {
            let n = self.device.read(&mut buf)?;
            if n == 0 {
                break;
            }
            match report::parse(&buf[..n]) {
                Some(r) => changed |= self.tracker.apply(r, state, &mut self.device),
                None => tracing::debug!(path = %self.path, len = n, "short report"),
            }
        }
        Ok(changed)
    }
}

fn is_wiimote(info: &DeviceInfo) -> bool {
    info.vendor_id() == report::VENDOR_ID && report::PRODUCT_IDS.contains(&info.product_id())
}

/// [`ControllerIo`] over paired Wii Remotes.
pub struct HidIo {
    api: HidApi,
    slots: Vec<SlotState>,
    remotes: Vec<Option<Remote>>,
    found: Vec<DeviceInfo>,
}

impl HidIo {
    /// Open the HID subsystem with `capacity` slots.
    pub fn new(capacity: usize) -> Result<Self> {
        let api = HidApi::new()?;
        Ok(Self {
            api,
            slots: vec![SlotState::default(); capacity],
            remotes: (0..capacity).map(|_| None).collect(),
            found: Vec::new(),
        })
    }

    fn is_open(&self, path: &str) -> bool {
        self.remotes.iter().flatten().any(|r| r.path == path)
    }

    fn scan(&mut self, max: usize) {
        if let Err(e) = self.api.refresh_devices() {
            tracing::warn!(error = %e, "refreshing HID device list failed");
            return;
        }
        for info in self.api.device_list().filter(|i| is_wiimote(i)) {
            if self.found.len() >= max {
                break;
            }
            let path = info.path().to_string_lossy();
            let listed = self
                .found
                .iter()
                .any(|f| f.path().to_string_lossy() == path);
            if !listed && !self.is_open(&path) {
                self.found.push(info.clone());
            }
        }
    }

    fn remote(&mut self, slot: usize) -> Result<(&mut Remote, &mut SlotState)> {
        match (self.remotes.get_mut(slot), self.slots.get_mut(slot)) {
            (Some(Some(remote)), Some(state)) => Ok((remote, state)),
            _ => Err(Error::Io(format!("slot {slot} is not connected"))),
        }
    }
}

impl ControllerIo for HidIo {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn find(&mut self, max: usize, timeout: Duration) -> usize {
        self.found.clear();
        // A deadline past what `Instant` can hold degrades to a single scan.
        let deadline = Instant::now().checked_add(timeout);
        loop {
            self.scan(max);
            let now = Instant::now();
            let Some(deadline) = deadline.filter(|d| *d > now) else {
                break;
            };
            if self.found.len() >= max {
                break;
            }
            std::thread::sleep(SCAN_INTERVAL.min(deadline - now));
        }
        tracing::debug!(found = self.found.len(), "hid scan finished");
        self.found.len()
    }

    fn connect(&mut self, max: usize) -> usize {
        let max = max.min(self.slots.len());
        let found = std::mem::take(&mut self.found);
        for info in &found {
            let Some(slot) = (0..max).find(|&i| self.remotes[i].is_none()) else {
                break;
            };
            match Remote::open(&self.api, info) {
                Ok(mut remote) => {
                    let state = SlotState::connected();
                    if let Err(e) = remote.send_mode(&state) {
                        tracing::warn!(path = %remote.path, error = %e, "setting report mode failed");
                    }
                    if let Err(e) = remote.send(&report::status_request(false)) {
                        tracing::warn!(path = %remote.path, error = %e, "status request failed");
                    }
                    tracing::info!(slot, path = %remote.path, "remote connected");
                    self.slots[slot] = state;
                    self.remotes[slot] = Some(remote);
                }
                Err(e) => {
                    tracing::warn!(path = ?info.path(), error = %e, "opening remote failed");
                }
            }
        }
        self.remotes[..max].iter().filter(|r| r.is_some()).count()
    }

    fn poll(&mut self, max: usize) -> bool {
        let max = max.min(self.slots.len());
        let mut any = false;
        for i in 0..max {
            let Some(remote) = self.remotes[i].as_mut() else {
                continue;
            };
            let state = &mut self.slots[i];
            RemoteTracker::begin_poll(state);

            match remote.drain(state) {
                Ok(changed) => remote.tracker.end_poll(state, changed),
                Err(e) => {
                    tracing::warn!(slot = i, path = %remote.path, error = %e, "read failed, dropping remote");
                    remote.tracker.fail(state);
                    self.remotes[i] = None;
                }
            }
            any |= state.event != crate::event::raw::NONE;
        }
        any
    }

    fn slot(&self, slot: usize) -> Option<&SlotState> {
        self.slots.get(slot)
    }

    fn set_leds(&mut self, slot: usize, mask: u8) -> Result<()> {
        let (remote, _) = self.remote(slot)?;
        let rumble = remote.tracker.rumble();
        remote.send(&report::leds(mask, rumble))
    }

    fn set_rumble(&mut self, slot: usize, on: bool) -> Result<()> {
        let (remote, _) = self.remote(slot)?;
        remote.send(&report::rumble(on))?;
        remote.tracker.set_rumble(on);
        Ok(())
    }

    fn set_motion_sensing(&mut self, slot: usize, on: bool) -> Result<()> {
        let (remote, state) = self.remote(slot)?;
        state.motion_sensing = on;
        remote.send_mode(state)
    }

    fn set_ir_tracking(&mut self, slot: usize, on: bool) -> Result<()> {
        let (remote, state) = self.remote(slot)?;
        let rumble = remote.tracker.rumble();
        if on {
            remote.send_all(&report::ir_enable_sequence(rumble))?;
        } else {
            remote.send_all(&report::ir_disable_sequence(rumble))?;
            state.ir = Default::default();
        }
        state.ir_tracking = on;
        remote.send_mode(state)
    }

    fn request_status(&mut self, slot: usize) -> Result<()> {
        let (remote, _) = self.remote(slot)?;
        let rumble = remote.tracker.rumble();
        remote.send(&report::status_request(rumble))
    }

    fn disconnect_all(&mut self, max: usize) {
        let max = max.min(self.slots.len());
        for i in 0..max {
            if let Some(mut remote) = self.remotes[i].take() {
                if remote.tracker.rumble() {
                    // Leave the motor off; the link closes on drop.
                    if let Err(e) = remote.send(&report::rumble(false)) {
                        tracing::debug!(slot = i, path = %remote.path, error = %e, "stopping rumble failed");
                    }
                }
                tracing::debug!(slot = i, path = %remote.path, "remote closed");
            }
            self.slots[i] = SlotState::default();
        }
        self.found.clear();
    }

    fn metadata(&self, slot: usize) -> DeviceMeta {
        match self.remotes.get(slot) {
            Some(Some(r)) => r.meta.clone(),
            _ => DeviceMeta::on_bus("bluetooth"),
        }
    }
}
