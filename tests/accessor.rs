// Accessor routine behaviour against a live runtime.
// Run with: cargo test --test accessor -- --nocapture

use dmxp_probe_runtime::Accessor::{Frame, Insn, RoutineBuilder, ACCESSOR_MAX_STACK};
use dmxp_probe_runtime::Channel::Host;
use dmxp_probe_runtime::Core::{ProbeStore, Probes, Record, RecordStore, UnitId};
use dmxp_probe_runtime::Runtime::Runtime;
use dmxp_probe_runtime::{Fault, GenerateError, ProbeRuntime, RuntimeBuilder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct CountingStore {
    inner: ProbeStore,
    lookups: AtomicUsize,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: ProbeStore::new(),
            lookups: AtomicUsize::new(0),
        }
    }
}

impl RecordStore for CountingStore {
    fn get(&self, id: UnitId) -> Option<Record> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get(id)
    }
}

fn private_runtime(store: Arc<dyn RecordStore>) -> (Arc<Host>, ProbeRuntime) {
    let host = Arc::new(Host::new("accessor-tests"));
    let rt = RuntimeBuilder::new().with_host(host.clone()).build(store);
    rt.start().expect("runtime should start");
    (host, rt)
}

#[test]
fn test_end_to_end_record_is_shared_not_copied() {
    let store = Arc::new(ProbeStore::new());
    let seeded = store.insert(0x2A, Probes::from_slice(&[false, false, true]));
    let (host, rt) = private_runtime(store.clone());

    let routine = rt.accessor(0x2A).unwrap();
    let record = routine.resolve(&host).unwrap();

    assert!(Arc::ptr_eq(&record, &seeded));
    assert_eq!(record.snapshot(), vec![false, false, true]);

    // Flip through the unit's handle, observe through the store
    assert!(record.set(2, false));
    let via_store = store.get(0x2A).unwrap();
    assert_eq!(via_store.get(2), Some(false));
    assert_eq!(via_store.snapshot(), vec![false, false, false]);
}

#[test]
fn test_every_stored_id_resolves_to_identical_record() {
    let store = Arc::new(ProbeStore::new());
    let ids: Vec<UnitId> = vec![0, 1, -1, 0x7fff_ffff_ffff, i64::MIN, i64::MAX];
    let records: Vec<Record> = ids
        .iter()
        .enumerate()
        .map(|(n, &id)| store.get_or_create(id, n + 1))
        .collect();
    let (host, rt) = private_runtime(store);

    for (id, expected) in ids.iter().zip(records.iter()) {
        let got = rt.accessor(*id).unwrap().resolve(&host).unwrap();
        assert!(Arc::ptr_eq(&got, expected), "record for {id:x} was not the stored one");
    }
}

#[test]
fn test_unknown_id_faults_once_and_leaves_store_alone() {
    let store = Arc::new(CountingStore::new());
    store.inner.get_or_create(1, 4);
    let (host, rt) = private_runtime(store.clone());

    let err = rt.accessor(0xDEAD).unwrap().resolve(&host).unwrap_err();

    assert_eq!(err, Fault::UnknownUnitId(0xDEAD));
    assert_eq!(err.to_string(), "unknown unit id dead");
    assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
    assert_eq!(store.inner.len(), 1);
    assert!(!store.inner.contains(0xDEAD));
}

#[test]
fn test_routine_can_run_repeatedly() {
    let store = Arc::new(ProbeStore::new());
    let seeded = store.get_or_create(9, 2);
    let (host, rt) = private_runtime(store);
    let routine = rt.accessor(9).unwrap();

    let mut frame = Frame::new(&host);
    for _ in 0..3 {
        let _ = frame.run(&routine).unwrap();
        assert!(Arc::ptr_eq(&routine.resolve(&host).unwrap(), &seeded));
    }
}

#[test]
fn test_generation_reports_stack_bound() {
    let (_host, rt) = private_runtime(Arc::new(ProbeStore::new()));
    let mut gen = RoutineBuilder::new();

    let needed = rt.generate_data_accessor(5, &mut gen).unwrap();
    gen.ret();
    let routine = gen.finish();

    assert_eq!(needed, ACCESSOR_MAX_STACK);
    assert_eq!(routine.max_stack(), ACCESSOR_MAX_STACK);
    assert_eq!(routine.max_locals(), 1);
    assert_eq!(routine.code().last(), Some(&Insn::Return));
}

#[test]
fn test_generation_fails_on_host_without_channels() {
    let host = Arc::new(Host::without_channels("bare"));
    let rt = RuntimeBuilder::new()
        .with_host(host)
        .build(Arc::new(ProbeStore::new()));

    let mut gen = RoutineBuilder::new();
    let err = rt.generate_data_accessor(1, &mut gen).unwrap_err();

    assert_eq!(
        err,
        GenerateError::ChannelUnavailable {
            host: "bare".to_string()
        }
    );
    assert!(gen.is_empty());
    assert!(rt.accessor(1).is_err());
}

#[test]
fn test_unstarted_runtime_leaves_id_in_slot() {
    let store = Arc::new(ProbeStore::new());
    store.get_or_create(3, 1);
    let host = Arc::new(Host::new("unstarted"));
    let rt = RuntimeBuilder::new()
        .with_host(host.clone())
        .build(store);

    let err = rt.accessor(3).unwrap().resolve(&host).unwrap_err();

    assert_eq!(
        err,
        Fault::UnexpectedPayload {
            expected: "probes",
            found: "boxed long"
        }
    );
}
