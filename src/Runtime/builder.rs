use super::lifecycle::ProbeRuntime;
use crate::Channel::host::Host;
use crate::Core::env::env_get;
use crate::Core::store::RecordStore;
use std::sync::Arc;

/// Well-known channel name used when nothing else is configured.
pub const DEFAULT_CHANNEL: &str = "dmxp-probe-runtime";

/// Environment variable overriding the channel name.
pub const CHANNEL_ENV: &str = "DMXP_PROBE_CHANNEL";

#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub channel: String,
    pub host: Arc<Host>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL.to_string(),
            host: Host::global(),
        }
    }
}

impl RuntimeConfig {
    /// Defaults, with the channel name taken from `DMXP_PROBE_CHANNEL` when
    /// set to something other than blanks.
    pub fn from_env() -> Self {
        let channel: String = env_get(CHANNEL_ENV, String::new());
        let channel = match channel.trim() {
            "" => DEFAULT_CHANNEL.to_string(),
            name => name.to_string(),
        };
        Self {
            channel,
            ..Self::default()
        }
    }
}

pub struct RuntimeBuilder {
    config: RuntimeConfig,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self {
            config: RuntimeConfig::default(),
        }
    }
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: RuntimeConfig) -> Self {
        Self { config }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.config.channel = channel.into();
        self
    }

    pub fn with_host(mut self, host: Arc<Host>) -> Self {
        self.config.host = host;
        self
    }

    pub fn build(self, store: Arc<dyn RecordStore>) -> ProbeRuntime {
        ProbeRuntime::with_config(store, self.config)
    }
}
