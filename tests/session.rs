use motelink::backends::mock::{MockIo, SimInput};
use motelink::event::raw;
use motelink::{connect_and_run, DeviceState, Event, EventKind, PoolConfig, StopFlag};
use std::collections::HashMap;
use std::thread;
use std::time::Duration;

fn fast(capacity: usize) -> PoolConfig {
    PoolConfig {
        tick_interval_ms: 0,
        ..PoolConfig::with_capacity(capacity)
    }
}

#[test]
fn session_ends_after_every_controller_disconnects() {
    const DEVICES: usize = 3;
    const TICKS: usize = 5;

    let (io, radio) = MockIo::new(4);
    radio.place_in_range(DEVICES);
    for _ in 0..TICKS - 1 {
        radio.queue_tick((0..DEVICES).map(|s| (s, SimInput::Event(raw::EVENT))).collect());
    }
    radio.queue_tick(
        (0..DEVICES)
            .map(|s| (s, SimInput::Event(raw::DISCONNECT)))
            .collect(),
    );
    // Anything after the last disconnect must never be polled.
    radio.queue_event(0, raw::STATUS);

    let mut disconnects: HashMap<usize, usize> = HashMap::new();
    let mut sink = |ev: &Event, _: &DeviceState| {
        if ev.kind.is_disconnect() {
            *disconnects.entry(ev.handle.index()).or_default() += 1;
        }
    };
    let summary = connect_and_run(io, fast(4), &mut sink, None).unwrap();

    assert_eq!(summary.connected, DEVICES);
    assert_eq!(summary.ticks, TICKS as u64);
    assert!(!summary.stopped);
    assert_eq!(disconnects.len(), DEVICES);
    assert!(disconnects.values().all(|&n| n == 1));

    let calls = radio.calls();
    assert!(calls.poll <= TICKS + 1);
    assert_eq!(calls.disconnect_all, 1);
    assert_eq!(radio.pending_ticks(), 1);
}

#[test]
fn staggered_disconnects_keep_the_session_alive() {
    let (io, radio) = MockIo::new(2);
    radio.place_in_range(2);
    radio.queue_event(1, raw::UNEXPECTED_DISCONNECT);
    radio.queue_idle();
    radio.queue_event(0, raw::EVENT);
    radio.queue_tick(vec![(0, SimInput::SilentDrop)]);

    let mut kinds = Vec::new();
    let mut sink = |ev: &Event, _: &DeviceState| kinds.push((ev.handle.index(), ev.kind));
    let summary = connect_and_run(io, fast(2), &mut sink, None).unwrap();

    assert_eq!(
        kinds,
        vec![
            (1, EventKind::UnexpectedDisconnect),
            (0, EventKind::Generic),
            (0, EventKind::UnexpectedDisconnect),
        ]
    );
    assert_eq!(summary.ticks, 4);
    assert_eq!(summary.dispatched, 3);
}

#[test]
fn stop_flag_from_another_thread() {
    let stop = StopFlag::new();
    let remote = stop.clone();

    let worker = thread::spawn(move || {
        let (io, radio) = MockIo::new(4);
        radio.place_in_range(1);
        let config = PoolConfig {
            tick_interval_ms: 1,
            ..PoolConfig::default()
        };
        let mut sink = |_: &Event, _: &DeviceState| {};
        let summary = connect_and_run(io, config, &mut sink, Some(&remote)).unwrap();
        (summary, radio.calls())
    });

    thread::sleep(Duration::from_millis(30));
    stop.stop();
    let (summary, calls) = worker.join().unwrap();

    assert!(summary.stopped);
    assert_eq!(summary.connected, 1);
    assert_eq!(summary.dispatched, 0);
    assert_eq!(calls.disconnect_all, 1);
}
