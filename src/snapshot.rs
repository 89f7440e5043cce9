//! Per-tick snapshot of device states.
//!
//! [`Snapshot`] is an **owned**, read-only view of every live controller at a
//! point in time, produced by [`DevicePool::snapshot`](crate::pool::DevicePool::snapshot).
//! Entries are in connection order. It is cheap to clone for fan-out and
//! serializes to JSON for tooling.
//!
//! # Semantics
//! - A snapshot is **immutable**. To refresh, poll the pool and take a new one.
//! - A snapshot does **not** keep handles alive; they may go stale while the
//!   snapshot is still around.
//!
//! # Example
//! ```no_run
//! use motelink::Snapshot;
//!
//! fn print_rolls(snap: &Snapshot) {
//!     for (handle, state) in snap.iter() {
//!         match state.roll() {
//!             Some(r) => println!("{handle}: roll={r:.1}"),
//!             None => println!("{handle}: motion sensing off"),
//!         }
//!     }
//! }
//! ```

use crate::device::{DeviceHandle, DeviceState};
use crate::error::Result;
use serde::Serialize;

/// Owned snapshot of `(handle, state)` pairs in connection order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Snapshot(Vec<(DeviceHandle, DeviceState)>);

impl Snapshot {
    pub(crate) fn new(entries: Vec<(DeviceHandle, DeviceState)>) -> Self {
        Self(entries)
    }

    /// Get the state captured for `handle`.
    pub fn get(&self, handle: DeviceHandle) -> Option<&DeviceState> {
        self.0.iter().find(|(h, _)| *h == handle).map(|(_, st)| st)
    }

    /// Iterate `(handle, state)` pairs.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (DeviceHandle, &DeviceState)> {
        self.0.iter().map(|(h, st)| (*h, st))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize to a JSON array of `[handle, state]` pairs.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
