// Error types for the probe runtime.
//
// Faults happen while a routine executes, GenerateError while a routine is
// being built, RuntimeError on lifecycle transitions.

use crate::Core::store::UnitId;

/// A run-time failure raised while executing an accessor routine or while a
/// subscriber handles a published message.
///
/// Every fault is local to the thread that ran the routine. None of them are
/// retried: the unit whose initialization hit the fault fails to initialize.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    /// The interceptor was asked for a unit the store has never seen.
    /// This is a generator/store mismatch, not a transient condition.
    #[error("unknown unit id {0:x}")]
    UnknownUnitId(UnitId),

    /// A value of the wrong kind sat where the protocol expects something
    /// specific (e.g. the payload slot after publish held no record).
    #[error("unexpected payload: expected {expected}, found {found}")]
    UnexpectedPayload {
        expected: &'static str,
        found: &'static str,
    },

    #[error("operand stack underflow")]
    StackUnderflow,

    #[error("local slot {0} is not allocated")]
    BadLocal(u16),

    #[error("index {index} out of bounds for container of length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    /// An instruction found an operand of the wrong kind on the stack.
    #[error("{op}: operand has kind {found}")]
    TypeMismatch {
        op: &'static str,
        found: &'static str,
    },

    /// The host has no channel facility, or no channel by that name.
    #[error("channel '{0}' cannot be resolved on this host")]
    ChannelMissing(String),
}

/// Failure while generating an accessor routine. Raised at build time so
/// that no routine is ever emitted that could only fail once it runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    #[error("host '{host}' provides no channel facility")]
    ChannelUnavailable { host: String },
}

/// Failure of a lifecycle transition on a [`ProbeRuntime`](crate::ProbeRuntime).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// `start()` after an explicit `stop()`; Inactive is terminal.
    #[error("runtime was stopped and cannot be restarted")]
    AlreadyStopped,

    #[error("host '{host}' provides no channel facility")]
    ChannelUnavailable { host: String },
}
