//! Controller I/O backends for `motelink`.
//!
//! [`ControllerIo`] is the narrow interface the pool drives: discover,
//! connect, poll, per-slot commands and bulk disconnect. Everything about the
//! radio link and report decoding lives behind it.
//!
//! # Implementations
//! - [`mock::MockIo`]: scripted in-memory controllers (always available).
//! - **`hid`** feature: `hid::HidIo`, Wii Remotes paired through the OS
//!   Bluetooth stack and read with `hidapi`. The report codec it uses lives
//!   in [`report`] and the per-remote transition logic in [`tracker`]; both
//!   are always compiled.

use crate::device::SlotState;
use crate::error::Result;
use crate::metadata::DeviceMeta;
use std::time::Duration;

pub mod mock;
pub mod report;
pub mod tracker;

#[cfg(feature = "hid")]
#[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
pub mod hid;

/// Native controller-I/O layer over a fixed array of device slots.
///
/// A backend is created with its capacity (the native `init`). Slot indices
/// are `0..capacity()`. All calls are synchronous and must return promptly,
/// except `find`, which may block up to its timeout.
pub trait ControllerIo {
    /// Number of native slots.
    fn capacity(&self) -> usize;

    /// Scan for up to `max` devices that are in range but not connected.
    /// Returns how many were found; `0` on timeout.
    fn find(&mut self, max: usize, timeout: Duration) -> usize;

    /// Connect every device found by the last `find`, filling free slots in
    /// discovery order. Returns the number of slots now connected.
    fn connect(&mut self, max: usize) -> usize;

    /// One non-blocking read across the first `max` slots. Afterwards every
    /// slot's [`SlotState`] (including its raw event code) is current.
    /// Returns `false` if nothing happened.
    fn poll(&mut self, max: usize) -> bool;

    /// Current native state of `slot`, `None` if out of range.
    fn slot(&self, slot: usize) -> Option<&SlotState>;

    fn set_leds(&mut self, slot: usize, mask: u8) -> Result<()>;

    fn set_rumble(&mut self, slot: usize, on: bool) -> Result<()>;

    fn set_motion_sensing(&mut self, slot: usize, on: bool) -> Result<()>;

    fn set_ir_tracking(&mut self, slot: usize, on: bool) -> Result<()>;

    /// Ask the device for a status report (answered by a later `status` event).
    fn request_status(&mut self, slot: usize) -> Result<()>;

    /// Disconnect every slot and release native resources.
    fn disconnect_all(&mut self, max: usize);

    /// Descriptive metadata for `slot`.
    fn metadata(&self, _slot: usize) -> DeviceMeta {
        DeviceMeta::default()
    }
}
