//! Device metadata snapshot.
//!
//! [`DeviceMeta`] is a lightweight, cloneable description of a connected
//! controller suitable for UI display and logging. Backends populate what
//! they know; unknown fields remain `None`.
//!
//! # Conventions
//! - `bus` is a short, human-readable bus hint like `"bluetooth"` or `"mock"`.
//! - `path` is an OS path (opaque string) useful for diagnostics. It may change
//!   across reconnects; treat it as diagnostic first, identity second.

use serde::{Deserialize, Serialize};

/// Snapshot of metadata describing a single device.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMeta {
    /// High-level bus classification.
    pub bus: Option<String>,

    /// Vendor ID, if known.
    pub vid: Option<u16>,

    /// Product ID, if known.
    pub pid: Option<u16>,

    /// Human-readable product name from the driver/firmware.
    pub product_string: Option<String>,

    /// Serial number (on Bluetooth HID this is usually the device address).
    pub serial_number: Option<String>,

    /// OS path to the device.
    pub path: Option<String>,
}

impl DeviceMeta {
    /// Metadata carrying only a bus hint.
    pub fn on_bus(bus: &str) -> Self {
        Self {
            bus: Some(bus.to_string()),
            ..Self::default()
        }
    }
}
