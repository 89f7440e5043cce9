//! Events and the raw-code classifier.
//!
//! The native layer leaves one raw transition code per slot after every poll.
//! [`classify`] is the single mapping from those codes to the symbolic
//! [`EventKind`] vocabulary handed to sinks.
//!
//! ## Raw codes
//! | code | meaning | kind |
//! |---|---|---|
//! | 0 | nothing happened | – |
//! | 1 | button / motion / IR change | `generic` |
//! | 2 | status report | `status` |
//! | 3 | connected | `connected` |
//! | 4 | disconnected | `disconnected` |
//! | 5 | link lost | `unexpected_disconnect` |
//! | 6 | memory read finished | `read` |
//! | 7 / 8 | Nunchuk inserted / removed | `nunchuk_*` |
//! | 9 / 10 | Classic Controller inserted / removed | `classic_*` |
//! | 11 / 12 | Guitar Hero 3 inserted / removed | `guitarhero3_*` |

use crate::device::DeviceHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Raw transition codes as reported by the native controller layer.
pub mod raw {
    pub const NONE: u8 = 0;
    pub const EVENT: u8 = 1;
    pub const STATUS: u8 = 2;
    pub const CONNECT: u8 = 3;
    pub const DISCONNECT: u8 = 4;
    pub const UNEXPECTED_DISCONNECT: u8 = 5;
    pub const READ_DATA: u8 = 6;
    pub const NUNCHUK_INSERTED: u8 = 7;
    pub const NUNCHUK_REMOVED: u8 = 8;
    pub const CLASSIC_INSERTED: u8 = 9;
    pub const CLASSIC_REMOVED: u8 = 10;
    pub const GUITAR_INSERTED: u8 = 11;
    pub const GUITAR_REMOVED: u8 = 12;
}

/// Classified per-device transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Button, accelerometer or IR change.
    Generic,
    Status,
    Connected,
    Disconnected,
    UnexpectedDisconnect,
    /// A memory read requested from the device completed.
    #[serde(rename = "read")]
    ReadComplete,
    NunchukInserted,
    NunchukRemoved,
    ClassicInserted,
    ClassicRemoved,
    #[serde(rename = "guitarhero3_inserted")]
    GuitarInserted,
    #[serde(rename = "guitarhero3_removed")]
    GuitarRemoved,
}

impl EventKind {
    /// Every kind, in raw-code order.
    pub const ALL: [EventKind; 12] = [
        EventKind::Generic,
        EventKind::Status,
        EventKind::Connected,
        EventKind::Disconnected,
        EventKind::UnexpectedDisconnect,
        EventKind::ReadComplete,
        EventKind::NunchukInserted,
        EventKind::NunchukRemoved,
        EventKind::ClassicInserted,
        EventKind::ClassicRemoved,
        EventKind::GuitarInserted,
        EventKind::GuitarRemoved,
    ];

    /// Stable symbolic name.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Generic => "generic",
            EventKind::Status => "status",
            EventKind::Connected => "connected",
            EventKind::Disconnected => "disconnected",
            EventKind::UnexpectedDisconnect => "unexpected_disconnect",
            EventKind::ReadComplete => "read",
            EventKind::NunchukInserted => "nunchuk_inserted",
            EventKind::NunchukRemoved => "nunchuk_removed",
            EventKind::ClassicInserted => "classic_inserted",
            EventKind::ClassicRemoved => "classic_removed",
            EventKind::GuitarInserted => "guitarhero3_inserted",
            EventKind::GuitarRemoved => "guitarhero3_removed",
        }
    }

    /// Raw code this kind is classified from.
    pub fn raw_code(self) -> u8 {
        match self {
            EventKind::Generic => raw::EVENT,
            EventKind::Status => raw::STATUS,
            EventKind::Connected => raw::CONNECT,
            EventKind::Disconnected => raw::DISCONNECT,
            EventKind::UnexpectedDisconnect => raw::UNEXPECTED_DISCONNECT,
            EventKind::ReadComplete => raw::READ_DATA,
            EventKind::NunchukInserted => raw::NUNCHUK_INSERTED,
            EventKind::NunchukRemoved => raw::NUNCHUK_REMOVED,
            EventKind::ClassicInserted => raw::CLASSIC_INSERTED,
            EventKind::ClassicRemoved => raw::CLASSIC_REMOVED,
            EventKind::GuitarInserted => raw::GUITAR_INSERTED,
            EventKind::GuitarRemoved => raw::GUITAR_REMOVED,
        }
    }

    /// `true` for both orderly and unexpected disconnects.
    #[inline]
    pub fn is_disconnect(self) -> bool {
        matches!(
            self,
            EventKind::Disconnected | EventKind::UnexpectedDisconnect
        )
    }

    /// `true` for connect and disconnect kinds.
    #[inline]
    pub fn is_connection_change(self) -> bool {
        self == EventKind::Connected || self.is_disconnect()
    }

    /// `true` for expansion insert/remove kinds.
    #[inline]
    pub fn is_expansion_change(self) -> bool {
        matches!(
            self,
            EventKind::NunchukInserted
                | EventKind::NunchukRemoved
                | EventKind::ClassicInserted
                | EventKind::ClassicRemoved
                | EventKind::GuitarInserted
                | EventKind::GuitarRemoved
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one raw code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// No pending transition this tick.
    Idle,
    Kind(EventKind),
    /// Code outside the supported set. A defect in the native layer; callers
    /// log it and carry on.
    Unrecognized(u8),
}

impl Transition {
    /// The classified kind, if any.
    pub fn kind(self) -> Option<EventKind> {
        match self {
            Transition::Kind(k) => Some(k),
            _ => None,
        }
    }
}

/// Map a raw native transition code to its event kind.
pub fn classify(code: u8) -> Transition {
    let kind = match code {
        raw::NONE => return Transition::Idle,
        raw::EVENT => EventKind::Generic,
        raw::STATUS => EventKind::Status,
        raw::CONNECT => EventKind::Connected,
        raw::DISCONNECT => EventKind::Disconnected,
        raw::UNEXPECTED_DISCONNECT => EventKind::UnexpectedDisconnect,
        raw::READ_DATA => EventKind::ReadComplete,
        raw::NUNCHUK_INSERTED => EventKind::NunchukInserted,
        raw::NUNCHUK_REMOVED => EventKind::NunchukRemoved,
        raw::CLASSIC_INSERTED => EventKind::ClassicInserted,
        raw::CLASSIC_REMOVED => EventKind::ClassicRemoved,
        raw::GUITAR_INSERTED => EventKind::GuitarInserted,
        raw::GUITAR_REMOVED => EventKind::GuitarRemoved,
        other => return Transition::Unrecognized(other),
    };
    Transition::Kind(kind)
}

/// A classified transition for one device, captured during a tick.
///
/// Events are handed to the sink by reference as soon as they are produced;
/// the pool does not keep them.
#[derive(Clone, Debug)]
pub struct Event {
    /// Device that produced the transition.
    pub handle: DeviceHandle,
    pub kind: EventKind,
    /// Capture time (monotonic).
    pub at: Instant,
}

impl Event {
    pub fn new(handle: DeviceHandle, kind: EventKind) -> Self {
        Self {
            handle,
            kind,
            at: Instant::now(),
        }
    }
}
