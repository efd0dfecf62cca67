// Lifecycle of a probe runtime: key derivation, interceptor registration,
// accessor generation.

use super::builder::{RuntimeBuilder, RuntimeConfig};
use super::interceptor::Interceptor;
use crate::error::{GenerateError, RuntimeError};
use crate::Accessor::builder::{Routine, RoutineBuilder};
use crate::Accessor::generator;
use crate::Channel::channel::{Channel, Subscriber};
use crate::Channel::host::Host;
use crate::Core::store::{RecordStore, UnitId};
use crossbeam_utils::atomic::AtomicCell;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

static INSTANCE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Registration state of a runtime's interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    /// Constructed, interceptor not registered.
    Created = 0,

    /// Interceptor registered; re-registers itself if the host sweeps it.
    Active = 1,

    /// Explicitly stopped. Terminal.
    Inactive = 2,
}

/// State shared between a runtime and its interceptor.
///
/// `transition` serializes start, stop and the interceptor's re-registration
/// so a sweep racing with `stop()` cannot leave a stale subscription behind.
/// `state` can be read without taking it.
pub(crate) struct Registration {
    pub(crate) state: AtomicCell<LifecycleState>,
    pub(crate) transition: Mutex<()>,
}

impl Registration {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicCell::new(LifecycleState::Created),
            transition: Mutex::new(()),
        }
    }
}

/// What the instrumentation pipeline and process glue see of a runtime.
pub trait Runtime {
    /// Append the accessor for `unit_id` to `gen`, leaving the unit's record
    /// on the operand stack. Returns the peak stack depth the code needs.
    fn generate_data_accessor(
        &self,
        unit_id: UnitId,
        gen: &mut RoutineBuilder,
    ) -> Result<usize, GenerateError>;

    fn start(&self) -> Result<(), RuntimeError>;

    fn stop(&self) -> Result<(), RuntimeError>;
}

/// Runtime that hands records to units over a host channel.
///
/// Units only need the host: a container, the well-known channel and a cast.
/// Nothing in the generated code refers to this crate.
pub struct ProbeRuntime {
    pub(crate) key: Arc<str>,
    pub(crate) channel_name: Arc<str>,
    pub(crate) host: Arc<Host>,
    pub(crate) channel: Option<Arc<Channel>>,
    pub(crate) interceptor: Arc<Interceptor>,
    pub(crate) registration: Arc<Registration>,
}

impl ProbeRuntime {
    /// Runtime on the global host with the default channel.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        RuntimeBuilder::new().build(store)
    }

    pub(crate) fn with_config(store: Arc<dyn RecordStore>, config: RuntimeConfig) -> Self {
        let registration = Arc::new(Registration::new());
        let key = derive_key(&registration);
        let interceptor = Arc::new(Interceptor::new(
            key.clone(),
            store,
            registration.clone(),
        ));
        // A host without the facility leaves us with no channel; start() and
        // generation report it.
        let channel = config.host.channel(&config.channel).ok();

        Self {
            key,
            channel_name: Arc::from(config.channel.as_str()),
            host: config.host,
            channel,
            interceptor,
            registration,
        }
    }

    /// The tag this runtime's messages carry.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    pub fn host(&self) -> &Arc<Host> {
        &self.host
    }

    pub fn state(&self) -> LifecycleState {
        self.registration.state.load()
    }

    pub fn interceptor(&self) -> &Arc<Interceptor> {
        &self.interceptor
    }

    /// Whether the interceptor is currently subscribed on the channel.
    pub fn is_registered(&self) -> bool {
        match &self.channel {
            Some(channel) => channel.is_subscribed(&self.subscriber()),
            None => false,
        }
    }

    /// Complete, returning routine for `unit_id`.
    pub fn accessor(&self, unit_id: UnitId) -> Result<Routine, GenerateError> {
        let mut gen = RoutineBuilder::new();
        self.generate_data_accessor(unit_id, &mut gen)?;
        gen.ret();
        Ok(gen.finish())
    }

    fn subscriber(&self) -> Arc<dyn Subscriber> {
        self.interceptor.clone()
    }

    fn unavailable(&self) -> RuntimeError {
        RuntimeError::ChannelUnavailable {
            host: self.host.name().to_string(),
        }
    }
}

impl Runtime for ProbeRuntime {
    fn generate_data_accessor(
        &self,
        unit_id: UnitId,
        gen: &mut RoutineBuilder,
    ) -> Result<usize, GenerateError> {
        generator::generate_data_accessor(
            unit_id,
            &self.key,
            &self.channel_name,
            &self.host,
            gen,
        )
    }

    fn start(&self) -> Result<(), RuntimeError> {
        let _transition = self.registration.transition.lock();
        match self.registration.state.load() {
            LifecycleState::Active => Ok(()),
            LifecycleState::Inactive => Err(RuntimeError::AlreadyStopped),
            LifecycleState::Created => {
                let channel = self.channel.as_ref().ok_or_else(|| self.unavailable())?;
                channel.subscribe(self.subscriber());
                self.registration.state.store(LifecycleState::Active);
                info!(
                    channel = %self.channel_name,
                    host = %self.host.name(),
                    "probe runtime started"
                );
                Ok(())
            }
        }
    }

    fn stop(&self) -> Result<(), RuntimeError> {
        let _transition = self.registration.transition.lock();
        let previous = self.registration.state.swap(LifecycleState::Inactive);
        if previous == LifecycleState::Active {
            if let Some(channel) = &self.channel {
                channel.unsubscribe(&self.subscriber());
            }
            info!(channel = %self.channel_name, "probe runtime stopped");
        }
        Ok(())
    }
}

impl Drop for ProbeRuntime {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

// First 16 hex digits of SHA-256 over pid, per-process instance number and
// the registration's address.
fn derive_key(registration: &Arc<Registration>) -> Arc<str> {
    let mut hasher = Sha256::new();
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(INSTANCE_COUNTER.fetch_add(1, Ordering::Relaxed).to_le_bytes());
    hasher.update((Arc::as_ptr(registration) as usize).to_le_bytes());
    let digest = format!("{:x}", hasher.finalize());
    Arc::from(&digest[..16])
}
