use motelink::backends::hid::HidIo;
use motelink::{
    connect_and_run, EventBus, EventFilter, FilteredListener, LogListener, PoolConfig, StopFlag,
};
use tracing_subscriber::EnvFilter;

fn main() -> motelink::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => PoolConfig::load(path)?,
        None => PoolConfig::default(),
    };

    let mut bus = EventBus::new();
    bus.add_listener(LogListener::new(), EventFilter::ConnectionOnly, None);
    bus.add_listener(
        FilteredListener::new(|_, st| st.buttons() != 0, LogListener::new()),
        EventFilter::All,
        None,
    );

    // Enter on stdin ends the session early.
    let stop = StopFlag::new();
    let on_enter = stop.clone();
    std::thread::spawn(move || {
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_ok() {
            on_enter.stop();
        }
    });

    let io = HidIo::new(config.capacity)?;
    let summary = connect_and_run(io, config, &mut bus, Some(&stop))?;
    if summary.stopped {
        println!("stopped from stdin");
    }
    println!(
        "{} controller(s), {} ticks, {} events",
        summary.connected, summary.ticks, summary.dispatched
    );
    Ok(())
}
