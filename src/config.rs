//! Pool configuration.
//!
//! [`PoolConfig`] is owned by each [`DevicePool`](crate::pool::DevicePool).
//! It can be built in code or loaded from TOML:
//!
//! ```toml
//! capacity = 4
//! discovery_timeout_secs = 5
//! tick_interval_ms = 2
//! ```
//!
//! Missing keys fall back to the defaults.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default number of controller slots.
pub const DEFAULT_CAPACITY: usize = 4;
/// Default discovery timeout in seconds.
pub const DEFAULT_DISCOVERY_TIMEOUT_SECS: u64 = 10;
/// Default pause between ticks of the connect-and-run loop.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1;
/// Longest accepted discovery timeout (one hour).
pub const MAX_DISCOVERY_TIMEOUT_SECS: u64 = 60 * 60;
/// Longest accepted pause between ticks (one minute).
pub const MAX_TICK_INTERVAL_MS: u64 = 60 * 1000;

/// Per-session settings for a [`DevicePool`](crate::pool::DevicePool).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of simultaneously connected controllers (N).
    pub capacity: usize,
    /// How long `discover` may scan for devices.
    pub discovery_timeout_secs: u64,
    /// Sleep between ticks in [`connect_and_run`](crate::poll_loop::connect_and_run).
    /// `0` busy-polls.
    pub tick_interval_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            discovery_timeout_secs: DEFAULT_DISCOVERY_TIMEOUT_SECS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl PoolConfig {
    /// Config with the given capacity and default timings.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Parse a TOML document and validate it.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: PoolConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject values the pool cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::Config("capacity must be at least 1".into()));
        }
        if self.discovery_timeout_secs > MAX_DISCOVERY_TIMEOUT_SECS {
            return Err(Error::Config(format!(
                "discovery_timeout_secs must be at most {MAX_DISCOVERY_TIMEOUT_SECS}, got {}",
                self.discovery_timeout_secs
            )));
        }
        if self.tick_interval_ms > MAX_TICK_INTERVAL_MS {
            return Err(Error::Config(format!(
                "tick_interval_ms must be at most {MAX_TICK_INTERVAL_MS}, got {}",
                self.tick_interval_ms
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }

    #[inline]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
