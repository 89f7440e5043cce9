//! # motelink
//!
//! Pool, discovery and poll loop for Wii Remote controllers.
//!
//! A [`DevicePool`] drives a [`ControllerIo`](backends::ControllerIo)
//! backend: it discovers controllers in range, connects them, lights their
//! player indicator, and turns each poll of the native layer into at most one
//! classified [`Event`] per controller, dispatched in connection order.
//!
//! ## Quick start
//! ```no_run
//! # #[cfg(feature = "hid")]
//! # fn main() -> motelink::Result<()> {
//! use motelink::backends::hid::HidIo;
//! use motelink::{DevicePool, DeviceState, Event, PoolConfig};
//!
//! let config = PoolConfig::default();
//! let mut pool = DevicePool::new(HidIo::new(config.capacity)?, config)?;
//! pool.discover();
//! pool.connect();
//! loop {
//!     pool.tick(&mut |ev: &Event, st: &DeviceState| {
//!         println!("{}: {} buttons={:#06x}", ev.handle, ev.kind, st.buttons());
//!     });
//! }
//! # }
//! # #[cfg(not(feature = "hid"))]
//! # fn main() {}
//! ```
//!
//! For a self-contained session that ends once every controller has
//! disconnected, see [`connect_and_run`].
//!
//! ## Features
//! - `hid`: real controllers through `hidapi` ([`backends::hid`]). Off by
//!   default; the in-memory [`backends::mock`] backend is always available.

pub mod backends;
pub mod config;
pub mod constants;
pub mod device;
pub mod error;
pub mod event;
pub mod eventbus;
pub mod filtered_listener;
pub mod indicator;
pub mod logger;
pub mod metadata;
pub mod poll_loop;
pub mod pool;
pub mod snapshot;

pub use backends::ControllerIo;
pub use config::PoolConfig;
pub use constants::Expansion;
pub use device::{DeviceHandle, DeviceState, IrDot, IrState, Orientation, SlotState};
pub use error::{Error, Result};
pub use event::{Event, EventKind};
pub use eventbus::{EventBus, EventFilter, EventListener};
pub use filtered_listener::FilteredListener;
pub use indicator::Indicator;
pub use logger::LogListener;
pub use metadata::DeviceMeta;
pub use poll_loop::{connect_and_run, EventSink, SessionSummary, StopFlag};
pub use pool::DevicePool;
pub use snapshot::Snapshot;
