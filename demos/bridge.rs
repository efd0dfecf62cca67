// Seeds a store, starts the runtime on the process host, initializes a few
// "units" on worker threads and then runs the host teardown sweep.
//
// Run with: RUST_LOG=debug cargo run --example bridge -- [units]

use dmxp_probe_runtime::Channel::Host;
use dmxp_probe_runtime::Core::{ProbeStore, UnitId};
use dmxp_probe_runtime::Runtime::{Runtime, RuntimeConfig};
use dmxp_probe_runtime::RuntimeBuilder;
use std::env;
use std::sync::Arc;
use std::thread;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let units: i64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(8);

    let store = Arc::new(ProbeStore::new());
    for id in 0..units {
        store.get_or_create(0x1000 + id, 16);
    }

    let config = RuntimeConfig::from_env();
    println!("Bridge: channel '{}'", config.channel);
    let runtime = Arc::new(RuntimeBuilder::from_config(config).build(store.clone()));
    runtime.start()?;

    let host = Host::global();
    host.teardown_on_interrupt()?;

    // Every unit grabs its record once, then records a few observations
    let handles: Vec<_> = (0..units)
        .map(|n| {
            let runtime = runtime.clone();
            let host = host.clone();
            thread::spawn(move || -> Result<UnitId, String> {
                let id = 0x1000 + n;
                let routine = runtime.accessor(id).map_err(|e| e.to_string())?;
                let probes = routine.resolve(&host).map_err(|e| e.to_string())?;
                for p in (0..probes.len()).step_by(n as usize + 1) {
                    probes.hit(p);
                }
                Ok(id)
            })
        })
        .collect();

    for h in handles {
        match h.join() {
            Ok(Ok(id)) => println!("Unit {:x}: initialized", id),
            Ok(Err(e)) => eprintln!("Unit failed to initialize: {}", e),
            Err(_) => eprintln!("Unit thread panicked"),
        }
    }

    for (id, bits) in store.snapshot() {
        let hits = bits.iter().filter(|b| **b).count();
        println!("Unit {:x}: {}/{} probes hit", id, hits, bits.len());
    }

    // Same sweep Ctrl+C would trigger; an active runtime puts itself back
    host.shutdown();

    println!(
        "Bridge: after sweep, interceptor registered = {}",
        runtime.is_registered()
    );

    runtime.stop()?;
    println!("Bridge: stopped");
    Ok(())
}
