// Concurrent unit initialization.
// Run with: cargo test --test concurrency -- --nocapture

use dmxp_probe_runtime::Channel::Host;
use dmxp_probe_runtime::Core::{ProbeStore, Probes, Record, UnitId};
use dmxp_probe_runtime::Runtime::Runtime;
use dmxp_probe_runtime::{Fault, RuntimeBuilder};
use std::collections::HashMap;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_distinct_ids_from_many_threads() {
    let threads = 32;
    let host = Arc::new(Host::new("concurrency"));
    let store = Arc::new(ProbeStore::new());

    let mut ids: Vec<UnitId> = (0..threads as i64).map(|i| i * 0x1_0000 + 3).collect();
    fastrand::shuffle(&mut ids);

    // Each record's length encodes its id so a cross-assignment is visible
    let expected: HashMap<UnitId, Record> = ids
        .iter()
        .enumerate()
        .map(|(n, &id)| (id, store.insert(id, Probes::new(n + 1))))
        .collect();

    let rt = Arc::new(
        RuntimeBuilder::new()
            .with_host(host.clone())
            .build(store.clone()),
    );
    rt.start().unwrap();

    let barrier = Arc::new(Barrier::new(threads));
    let mut handles = vec![];
    for &id in &ids {
        let rt = rt.clone();
        let host = host.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            let routine = rt.accessor(id).unwrap();
            barrier.wait();
            let record = routine.resolve(&host).unwrap();
            (id, record)
        }));
    }

    for h in handles {
        let (id, record) = h.join().unwrap();
        assert!(
            Arc::ptr_eq(&record, &expected[&id]),
            "thread for unit {id:x} received another unit's record"
        );
    }
}

#[test]
fn test_concurrent_inserts_and_lookups() {
    let host = Arc::new(Host::new("concurrency"));
    let store = Arc::new(ProbeStore::new());
    let rt = Arc::new(
        RuntimeBuilder::new()
            .with_host(host.clone())
            .build(store.clone()),
    );
    rt.start().unwrap();

    let writers = 4;
    let per_writer = 200;
    let mut handles = vec![];

    for w in 0..writers {
        let store = store.clone();
        let rt = rt.clone();
        let host = host.clone();
        handles.push(thread::spawn(move || {
            for i in 0..per_writer {
                let id = (w * per_writer + i) as UnitId;
                let record = store.get_or_create(id, 4);
                let got = rt.accessor(id).unwrap().resolve(&host).unwrap();
                assert!(Arc::ptr_eq(&got, &record));
                got.hit(i % 4);
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(store.len(), writers * per_writer);
    for (_, bits) in store.snapshot() {
        assert_eq!(bits.iter().filter(|b| **b).count(), 1);
    }
}

#[test]
fn test_unknown_ids_fail_independently_per_thread() {
    let host = Arc::new(Host::new("concurrency"));
    let store = Arc::new(ProbeStore::new());
    store.get_or_create(0, 1);
    let rt = Arc::new(
        RuntimeBuilder::new()
            .with_host(host.clone())
            .build(store.clone()),
    );
    rt.start().unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i: UnitId| {
            let rt = rt.clone();
            let host = host.clone();
            thread::spawn(move || rt.accessor(i).unwrap().resolve(&host))
        })
        .collect();

    for (i, h) in handles.into_iter().enumerate() {
        match h.join().unwrap() {
            Ok(_) => assert_eq!(i, 0),
            Err(e) => assert_eq!(e, Fault::UnknownUnitId(i as UnitId)),
        }
    }
    assert_eq!(store.len(), 1);
}
