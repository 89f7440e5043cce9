//! Device handles and cached per-device state.
//!
//! A [`DeviceHandle`] is a small copyable key into a
//! [`DevicePool`](crate::pool::DevicePool). It carries the native slot index
//! plus a generation counter; the pool bumps the generation whenever it
//! releases a slot, so a handle kept past `cleanup_all` (or past a
//! disconnect) is detected as stale instead of aliasing a newer device.
//!
//! [`SlotState`] is what a backend exposes for one native slot after a poll.
//! [`DeviceState`] is the pool's cached copy plus the bits the pool owns
//! (rumble, LEDs, assigned indicator, classified pending event).
//!
//! ## Capability gating
//! Orientation is only meaningful while motion sensing is on and IR data only
//! while IR tracking is on. The gated readers return `None` otherwise.

use crate::constants::Expansion;
use crate::event::{raw, EventKind};
use crate::indicator::Indicator;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation-checked key for one connected controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceHandle {
    index: u32,
    generation: u32,
}

impl DeviceHandle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Native slot index this handle refers to.
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mote#{}@{}", self.index, self.generation)
    }
}

/// Orientation in degrees, derived from the accelerometer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub yaw: f32,
    /// Smoothed pitch.
    pub pitch: f32,
    /// Smoothed roll.
    pub roll: f32,
    /// Unsmoothed pitch.
    pub abs_pitch: f32,
    /// Unsmoothed roll.
    pub abs_roll: f32,
}

/// One IR light source seen by the camera.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrDot {
    pub visible: bool,
    pub x: i32,
    pub y: i32,
}

/// IR camera tracking state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IrState {
    pub dots: [IrDot; 4],
    /// Cursor estimate (x, y).
    pub x: i32,
    pub y: i32,
    /// Distance estimate.
    pub z: f32,
}

/// Native per-slot state as exposed by a [`ControllerIo`](crate::backends::ControllerIo)
/// backend after each poll.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotState {
    pub connected: bool,
    /// Raw transition code left by the last poll (see [`raw`]).
    pub event: u8,
    /// Accelerometer reporting is on and `orientation` is valid.
    pub motion_sensing: bool,
    /// IR camera is on and `ir` is valid.
    pub ir_tracking: bool,
    /// Held core buttons.
    pub buttons: u16,
    /// Core buttons that went down during the last poll.
    pub buttons_pressed: u16,
    /// Held expansion buttons (Nunchuk / Classic / Guitar).
    pub expansion_buttons: u16,
    pub expansion: Expansion,
    pub orientation: Orientation,
    pub ir: IrState,
}

impl SlotState {
    /// Fresh state for a just-connected slot.
    pub fn connected() -> Self {
        Self {
            connected: true,
            event: raw::NONE,
            ..Self::default()
        }
    }
}

/// Cached state of one connected controller, owned by the pool.
///
/// Read it between ticks through [`DevicePool::get`](crate::pool::DevicePool::get);
/// it is only ever mutated by pool operations.
#[derive(Clone, Debug, Serialize)]
pub struct DeviceState {
    pub(crate) slot: usize,
    pub(crate) connected: bool,
    pub(crate) pending: Option<EventKind>,
    pub(crate) sensors: SlotState,
    pub(crate) rumble: bool,
    pub(crate) leds: u8,
    pub(crate) indicator: Option<Indicator>,
}

impl DeviceState {
    pub(crate) fn new(slot: usize, sensors: SlotState) -> Self {
        Self {
            slot,
            connected: true,
            pending: None,
            sensors,
            rumble: false,
            leds: 0,
            indicator: None,
        }
    }

    /// Native slot index.
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Event classified for this device in the most recent poll.
    #[inline]
    pub fn pending_event(&self) -> Option<EventKind> {
        self.pending
    }

    #[inline]
    pub fn uses_motion_sensing(&self) -> bool {
        self.sensors.motion_sensing
    }

    #[inline]
    pub fn uses_ir(&self) -> bool {
        self.sensors.ir_tracking
    }

    #[inline]
    pub fn rumble(&self) -> bool {
        self.rumble
    }

    /// LED mask last commanded on the device.
    #[inline]
    pub fn leds(&self) -> u8 {
        self.leds
    }

    /// Player indicator assigned at connect time.
    #[inline]
    pub fn indicator(&self) -> Option<Indicator> {
        self.indicator
    }

    #[inline]
    pub fn expansion(&self) -> Expansion {
        self.sensors.expansion
    }

    /// Raw held-button word.
    #[inline]
    pub fn buttons(&self) -> u16 {
        self.sensors.buttons
    }

    /// `true` if every button in `code` is held.
    pub fn is_pressed(&self, code: u16) -> bool {
        code != 0 && self.sensors.buttons & code == code
    }

    /// `true` if every button in `code` went down during the last poll.
    pub fn is_just_pressed(&self, code: u16) -> bool {
        code != 0 && self.sensors.buttons_pressed & code == code
    }

    /// `true` if every expansion button in `code` is held.
    pub fn is_expansion_pressed(&self, code: u16) -> bool {
        code != 0
            && self.sensors.expansion != Expansion::None
            && self.sensors.expansion_buttons & code == code
    }

    /// Full orientation, if motion sensing is on.
    pub fn orientation(&self) -> Option<Orientation> {
        self.sensors
            .motion_sensing
            .then_some(self.sensors.orientation)
    }

    pub fn yaw(&self) -> Option<f32> {
        self.orientation().map(|o| o.yaw)
    }

    pub fn pitch(&self) -> Option<f32> {
        self.orientation().map(|o| o.pitch)
    }

    pub fn roll(&self) -> Option<f32> {
        self.orientation().map(|o| o.roll)
    }

    pub fn absolute_pitch(&self) -> Option<f32> {
        self.orientation().map(|o| o.abs_pitch)
    }

    pub fn absolute_roll(&self) -> Option<f32> {
        self.orientation().map(|o| o.abs_roll)
    }

    /// Visible IR sources as `(x, y)`, if IR tracking is on. May be empty.
    pub fn ir_sources(&self) -> Option<Vec<(i32, i32)>> {
        if !self.sensors.ir_tracking {
            return None;
        }
        Some(
            self.sensors
                .ir
                .dots
                .iter()
                .filter(|d| d.visible)
                .map(|d| (d.x, d.y))
                .collect(),
        )
    }

    pub fn ir_cursor(&self) -> Option<(i32, i32)> {
        self.sensors
            .ir_tracking
            .then_some((self.sensors.ir.x, self.sensors.ir.y))
    }

    pub fn ir_z(&self) -> Option<f32> {
        self.sensors.ir_tracking.then_some(self.sensors.ir.z)
    }
}
