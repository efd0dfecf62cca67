// Module naming follows project convention (Core = store and shared helpers,
// Channel = host side channel, Accessor = generated routines, Runtime =
// interception and lifecycle)
#[allow(non_snake_case)]
pub mod Core {
    pub mod env;
    pub mod store;
    pub use store::{ProbeStore, Probes, Record, RecordStore, UnitId}; // re-export for stable path
}
#[allow(non_snake_case)]
pub mod Channel {
    pub mod channel;
    mod debug;
    pub mod host;
    pub mod message;
    pub use channel::Subscriber;
    pub use host::Host;
    pub use message::{ArrayRef, Message, Value};
}
#[allow(non_snake_case)]
pub mod Accessor {
    pub mod builder;
    pub mod frame;
    pub mod generator;
    pub mod insn;
    pub use builder::{Routine, RoutineBuilder};
    pub use frame::Frame;
    pub use generator::{generate_data_accessor, ACCESSOR_MAX_STACK};
    pub use insn::{Insn, Shape};
}
#[allow(non_snake_case)]
pub mod Runtime {
    pub mod builder;
    mod debug;
    pub mod interceptor;
    pub mod lifecycle;
    pub use builder::{RuntimeBuilder, RuntimeConfig, DEFAULT_CHANNEL};
    pub use interceptor::Interceptor;
    pub use lifecycle::{LifecycleState, ProbeRuntime, Runtime};
}
#[allow(non_snake_case)]
pub mod Debug {
    pub mod StructDebug;
}

pub mod error;

pub use error::{Fault, GenerateError, RuntimeError};
pub use Runtime::{LifecycleState, ProbeRuntime, RuntimeBuilder};
