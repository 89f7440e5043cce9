//! Scripted session against the in-memory backend. No hardware needed.

use motelink::backends::mock::{MockIo, SimInput};
use motelink::constants::buttons;
use motelink::event::raw;
use motelink::{connect_and_run, DeviceState, Event, EventKind, Expansion, PoolConfig};

fn main() -> motelink::Result<()> {
    tracing_subscriber::fmt().with_env_filter("debug").init();

    let (io, radio) = MockIo::new(4);
    radio.place_in_range(2);
    radio.queue_tick(vec![(
        0,
        SimInput::Buttons {
            held: buttons::A,
            pressed: buttons::A,
        },
    )]);
    radio.queue_idle();
    radio.queue_tick(vec![
        (0, SimInput::Expansion(Expansion::Nunchuk)),
        (1, SimInput::Event(raw::STATUS)),
    ]);
    radio.queue_kind(0, EventKind::NunchukInserted);
    radio.queue_tick(vec![(1, SimInput::SilentDrop)]);
    radio.queue_event(0, raw::DISCONNECT);

    let config = PoolConfig {
        tick_interval_ms: 0,
        ..PoolConfig::default()
    };
    let mut sink = |ev: &Event, st: &DeviceState| {
        println!(
            "{} {:<22} indicator={:?} A={}",
            ev.handle,
            ev.kind.to_string(),
            st.indicator(),
            st.is_pressed(buttons::A)
        );
    };
    let summary = connect_and_run(io, config, &mut sink, None)?;
    println!("{summary:?}");
    Ok(())
}
