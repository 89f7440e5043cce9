//! Event dispatch and the connect-and-run session.
//!
//! Two ways to drive a pool:
//! - **Managed**: keep a [`DevicePool`] and call
//!   [`DevicePool::tick`] whenever convenient. Nothing stops on its own; call
//!   `cleanup_all` (or drop the pool) when done.
//! - **Connect-and-run**: [`connect_and_run`] owns a pool for one session:
//!   discover, connect, tick until every controller has disconnected (or a
//!   [`StopFlag`] is raised), then clean up.
//!
//! Either way events are dispatched synchronously, in connection order, at
//! most one per device per tick. Nothing is buffered between ticks.

use crate::backends::ControllerIo;
use crate::config::PoolConfig;
use crate::device::DeviceState;
use crate::error::Result;
use crate::event::Event;
use crate::pool::DevicePool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Receiver of dispatched events.
///
/// `state` is the device's cached state as of this tick.
pub trait EventSink {
    fn dispatch(&mut self, event: &Event, state: &DeviceState);
}

impl<F> EventSink for F
where
    F: FnMut(&Event, &DeviceState),
{
    fn dispatch(&mut self, event: &Event, state: &DeviceState) {
        self(event, state)
    }
}

/// Cancellation flag for [`connect_and_run`], checked once per tick.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// What a connect-and-run session did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Controllers connected at the start of the session.
    pub connected: usize,
    /// Ticks run.
    pub ticks: u64,
    /// Events handed to the sink.
    pub dispatched: u64,
    /// The session ended because the stop flag was raised.
    pub stopped: bool,
}

/// Forwards to the caller's sink and tracks the live count.
struct LiveCounter<'a, S: ?Sized> {
    inner: &'a mut S,
    live: usize,
}

impl<S: EventSink + ?Sized> EventSink for LiveCounter<'_, S> {
    fn dispatch(&mut self, event: &Event, state: &DeviceState) {
        if event.kind.is_disconnect() {
            self.live = self.live.saturating_sub(1);
        }
        self.inner.dispatch(event, state);
    }
}

/// Run one self-contained session over `io`.
///
/// Discovers and connects up to `config.capacity` controllers, then ticks
/// until the live count (decremented on each `disconnected` /
/// `unexpected_disconnect` event) reaches zero or `stop` is raised. The pool
/// is cleaned up before returning. Sleeps `config.tick_interval()` between
/// ticks.
pub fn connect_and_run<I, S>(
    io: I,
    config: PoolConfig,
    sink: &mut S,
    stop: Option<&StopFlag>,
) -> Result<SessionSummary>
where
    I: ControllerIo,
    S: EventSink + ?Sized,
{
    let interval = config.tick_interval();
    let mut pool = DevicePool::new(io, config)?;
    let mut summary = SessionSummary::default();

    if pool.discover() == 0 {
        info!("no controllers found");
        pool.cleanup_all();
        return Ok(summary);
    }

    summary.connected = pool.connect();
    info!(connected = summary.connected, "session started");

    let mut counter = LiveCounter {
        inner: sink,
        live: summary.connected,
    };

    while counter.live > 0 {
        if stop.is_some_and(StopFlag::is_stopped) {
            summary.stopped = true;
            break;
        }
        summary.dispatched += pool.tick(&mut counter) as u64;
        summary.ticks += 1;
        if counter.live == 0 {
            break;
        }
        if !interval.is_zero() {
            std::thread::sleep(interval);
        }
    }

    debug!(ticks = summary.ticks, live = counter.live, "session loop finished");
    pool.cleanup_all();
    info!(
        dispatched = summary.dispatched,
        stopped = summary.stopped,
        "session ended"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::MockIo;
    use crate::event::{raw, EventKind};

    fn fast(capacity: usize) -> PoolConfig {
        PoolConfig {
            tick_interval_ms: 0,
            ..PoolConfig::with_capacity(capacity)
        }
    }

    #[test]
    fn closures_are_sinks() {
        let mut kinds = Vec::new();
        let mut sink = |ev: &Event, _: &DeviceState| kinds.push(ev.kind);
        let (io, radio) = MockIo::new(1);
        radio.place_in_range(1);
        radio.queue_event(0, raw::DISCONNECT);
        connect_and_run(io, fast(1), &mut sink, None).unwrap();
        assert_eq!(kinds, vec![EventKind::Disconnected]);
    }

    #[test]
    fn nothing_found_ends_immediately() {
        let (io, radio) = MockIo::new(4);
        let mut seen = 0usize;
        let mut sink = |_: &Event, _: &DeviceState| seen += 1;
        let summary = connect_and_run(io, fast(4), &mut sink, None).unwrap();
        assert_eq!(seen, 0);
        assert_eq!(summary, SessionSummary::default());
        assert_eq!(radio.calls().connect, 0);
        assert_eq!(radio.calls().poll, 0);
    }

    #[test]
    fn raised_stop_flag_ends_before_first_tick() {
        let (io, radio) = MockIo::new(2);
        radio.place_in_range(2);
        let stop = StopFlag::new();
        stop.stop();
        let mut sink = |_: &Event, _: &DeviceState| {};
        let summary = connect_and_run(io, fast(2), &mut sink, Some(&stop)).unwrap();
        assert!(summary.stopped);
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.connected, 2);
        assert_eq!(radio.calls().disconnect_all, 1);
    }

    #[test]
    fn stop_flag_clones_share_state() {
        let a = StopFlag::new();
        let b = a.clone();
        assert!(!b.is_stopped());
        a.stop();
        assert!(b.is_stopped());
    }
}
