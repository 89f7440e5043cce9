use motelink::backends::hid::HidIo;
use motelink::constants::buttons;
use motelink::{DevicePool, DeviceState, Event, EventKind, PoolConfig};

fn main() -> motelink::Result<()> {
    let config = PoolConfig::default();
    let mut pool = DevicePool::new(HidIo::new(config.capacity)?, config)?;

    println!("Press 1+2 on your remotes...");
    let found = pool.discover();
    let connected = pool.connect();
    println!("found {found}, connected {connected}");
    for (handle, st) in pool.iter() {
        let meta = pool.metadata(handle)?;
        println!(
            "- {handle} {:?} ({})",
            st.indicator(),
            meta.serial_number.as_deref().unwrap_or("?")
        );
    }

    let mut toggles = Vec::new();
    while pool.connected() > 0 {
        pool.tick(&mut |ev: &Event, st: &DeviceState| {
            if ev.kind != EventKind::Generic {
                println!("{}: {}", ev.handle, ev.kind);
            }
            if st.is_just_pressed(buttons::A) {
                toggles.push(ev.handle);
            }
        });
        for handle in toggles.drain(..) {
            let on = pool.get(handle).is_ok_and(|st| !st.uses_motion_sensing());
            pool.set_motion_sensing(handle, on)?;
        }
        for (handle, st) in pool.iter() {
            if let (Some(p), Some(r)) = (st.pitch(), st.roll()) {
                println!("{handle}: pitch={p:6.1} roll={r:6.1}");
            }
        }
        // Sleep a touch to avoid pegging the CPU in the demo
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    pool.cleanup_all();
    Ok(())
}
