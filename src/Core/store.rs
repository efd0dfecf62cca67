// Record store: unit id -> live probe record.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Identifier of an instrumented unit. Assigned outside this crate and
/// unique for the lifetime of one runtime instance.
pub type UnitId = i64;

/// Shared handle to a unit's probe array. Units and the store hold the same
/// allocation; identity is `Arc::ptr_eq`.
pub type Record = Arc<Probes>;

/// A fixed-length bit vector of probes.
///
/// Bits are atomics so an initialized unit can flip probes through its shared
/// handle while the store (or a reporter) reads them concurrently.
#[derive(Debug)]
pub struct Probes {
    bits: Box<[AtomicBool]>,
}

impl Probes {
    /// Create `len` probes, all unset.
    pub fn new(len: usize) -> Self {
        Self {
            bits: (0..len).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    pub fn from_slice(values: &[bool]) -> Self {
        Self {
            bits: values.iter().map(|&v| AtomicBool::new(v)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Read a single probe. `None` when `index` is out of range.
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).map(|b| b.load(Ordering::Acquire))
    }

    /// Write a single probe.
    /// Returns false (and writes nothing) when `index` is out of range.
    pub fn set(&self, index: usize, value: bool) -> bool {
        match self.bits.get(index) {
            Some(bit) => {
                bit.store(value, Ordering::Release);
                true
            }
            None => false,
        }
    }

    /// Mark a probe as executed.
    #[inline]
    pub fn hit(&self, index: usize) -> bool {
        self.set(index, true)
    }

    /// Copy the current probe values out.
    pub fn snapshot(&self) -> Vec<bool> {
        self.bits.iter().map(|b| b.load(Ordering::Acquire)).collect()
    }

    /// Clear every probe in place. Handles held by units stay valid.
    pub fn reset(&self) {
        for bit in self.bits.iter() {
            bit.store(false, Ordering::Release);
        }
    }
}

/// Lookup side of a record store, as consumed by the interceptor.
///
/// Implementations must tolerate `get` running concurrently with inserts on
/// other threads. Once a record exists for an id it must stay retrievable.
pub trait RecordStore: Send + Sync {
    fn get(&self, id: UnitId) -> Option<Record>;
}

/// Default in-memory store guarded by a single mutex.
///
/// Lookups only happen while units initialize, so one lock is enough.
#[derive(Default)]
pub struct ProbeStore {
    records: Mutex<HashMap<UnitId, Record>>,
}

impl ProbeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `probes` for `id`.
    ///
    /// An id that already has a record keeps it; the existing record is
    /// returned and `probes` is dropped.
    pub fn insert(&self, id: UnitId, probes: Probes) -> Record {
        let mut records = self.records.lock();
        records.entry(id).or_insert_with(|| Arc::new(probes)).clone()
    }

    /// Return the record for `id`, creating `len` unset probes if missing.
    pub fn get_or_create(&self, id: UnitId, len: usize) -> Record {
        let mut records = self.records.lock();
        records
            .entry(id)
            .or_insert_with(|| Arc::new(Probes::new(len)))
            .clone()
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.records.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Clear the probes of every record. Records and unit handles survive.
    pub fn reset(&self) {
        for record in self.records.lock().values() {
            record.reset();
        }
    }

    /// Copy out all probe values, ordered by unit id.
    pub fn snapshot(&self) -> Vec<(UnitId, Vec<bool>)> {
        let records = self.records.lock();
        let mut out: Vec<(UnitId, Vec<bool>)> = records
            .iter()
            .map(|(&id, record)| (id, record.snapshot()))
            .collect();
        out.sort_by_key(|(id, _)| *id);
        out
    }
}

impl RecordStore for ProbeStore {
    fn get(&self, id: UnitId) -> Option<Record> {
        self.records.lock().get(&id).cloned()
    }
}
