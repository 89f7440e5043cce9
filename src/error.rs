//! Error types for pool and backend operations.
//!
//! Most "nothing happened" outcomes (no devices in range, no data this tick)
//! are not errors and are reported as `0` / `false` by the pool. The variants
//! here cover programmer errors (stale handles, bad configuration) and native
//! I/O failures surfaced by per-device commands.

use crate::device::DeviceHandle;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by `motelink`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The handle was released by `cleanup_all` or a disconnect and no longer
    /// resolves to a device.
    #[error("stale device handle: {0}")]
    StaleHandle(DeviceHandle),

    /// Configuration value out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    ConfigRead(#[from] std::io::Error),

    /// The native controller-I/O layer rejected a command.
    #[error("controller I/O error: {0}")]
    Io(String),

    /// Snapshot serialization failed.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Error bubbled up from `hidapi`.
    #[cfg(feature = "hid")]
    #[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
    #[error("hid error: {0}")]
    Hid(#[from] hidapi::HidError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_handle_message_names_the_handle() {
        let h = DeviceHandle::new(2, 7);
        let msg = Error::StaleHandle(h).to_string();
        assert!(msg.contains("stale"));
        assert!(msg.contains(&h.to_string()));
    }

    #[test]
    fn io_error_message() {
        let e = Error::Io("led write failed".into());
        assert_eq!(e.to_string(), "controller I/O error: led write failed");
    }
}
