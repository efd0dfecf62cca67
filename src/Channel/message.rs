// Values moved around by accessor routines, and the message published on a
// channel.

use crate::error::Fault;
use crate::Channel::channel::Channel;
use crate::Core::store::Record;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// A value on the operand stack, in a local slot, or in a container slot.
#[derive(Clone)]
pub enum Value {
    Null,
    Int(i32),
    Long(i64),
    /// A long in its boxed form, the only shape a container slot accepts for
    /// a unit id.
    Boxed(i64),
    Str(Arc<str>),
    Array(ArrayRef),
    Channel(Arc<Channel>),
    Record(Record),
}

impl Value {
    /// Short name of the value's kind. Faults report kinds, never contents.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Boxed(_) => "boxed long",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Channel(_) => "channel",
            Value::Record(_) => "probes",
        }
    }
}

// Records and containers may carry live data; only their shape is printed.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Int(v) => write!(f, "Int({v})"),
            Value::Long(v) => write!(f, "Long({v})"),
            Value::Boxed(v) => write!(f, "Boxed({v})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Array(a) => write!(f, "Array(len={})", a.len()),
            Value::Channel(c) => write!(f, "Channel({})", c.name()),
            Value::Record(r) => write!(f, "Record(<{} probes>)", r.len()),
        }
    }
}

/// A shared, fixed-length container of values.
///
/// Cloning the handle shares the slots; this is how the interceptor's write
/// becomes visible to the routine that published the container.
#[derive(Clone)]
pub struct ArrayRef(Arc<Mutex<Box<[Value]>>>);

impl ArrayRef {
    /// A container of `len` null slots.
    pub fn new(len: usize) -> Self {
        Self(Arc::new(Mutex::new(vec![Value::Null; len].into_boxed_slice())))
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: i64) -> Result<Value, Fault> {
        let slots = self.0.lock();
        Self::slot(index, slots.len()).map(|i| slots[i].clone())
    }

    pub fn set(&self, index: i64, value: Value) -> Result<(), Fault> {
        let mut slots = self.0.lock();
        let i = Self::slot(index, slots.len())?;
        slots[i] = value;
        Ok(())
    }

    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn slot(index: i64, len: usize) -> Result<usize, Fault> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < len)
            .ok_or(Fault::IndexOutOfBounds { index, len })
    }
}

/// What a publisher hands to a channel: a textual key identifying the
/// intended recipient and a parameter container subscribers may rewrite.
pub struct Message {
    key: Arc<str>,
    params: ArrayRef,
}

impl Message {
    pub fn new(key: impl Into<Arc<str>>, params: ArrayRef) -> Self {
        Self {
            key: key.into(),
            params,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn params(&self) -> &ArrayRef {
        &self.params
    }
}
