// The execution environment accessor routines run in.
//
// A Host owns the registry of well-known channels and the "deregister
// everything at shutdown" sweep. Runtimes create their channel with
// channel(); running code only finds existing ones through lookup().

use super::channel::Channel;
use crate::error::Fault;
use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tracing::{debug, info};

/// Exit status after an interrupt-triggered sweep (128 + SIGINT).
pub const INTERRUPT_EXIT_CODE: i32 = 130;

lazy_static! {
    static ref GLOBAL_HOST: Arc<Host> = Arc::new(Host::new("process"));
}

pub struct Host {
    pub(crate) name: String,
    provides_channels: bool,
    pub(crate) channels: RwLock<HashMap<Arc<str>, Arc<Channel>>>,
}

impl Host {
    /// A host with the channel facility.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provides_channels: true,
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// A host that lacks the channel facility. Generating an accessor
    /// against it fails; running one faults with `ChannelMissing`.
    pub fn without_channels(name: impl Into<String>) -> Self {
        Self {
            provides_channels: false,
            ..Self::new(name)
        }
    }

    /// The process-wide host.
    pub fn global() -> Arc<Host> {
        GLOBAL_HOST.clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provides_channels(&self) -> bool {
        self.provides_channels
    }

    /// Look up a channel by name, creating it on first use.
    pub fn channel(&self, name: &str) -> Result<Arc<Channel>, Fault> {
        if !self.provides_channels {
            return Err(Fault::ChannelMissing(name.to_string()));
        }

        if let Some(channel) = self.channels.read().get(name) {
            return Ok(channel.clone());
        }

        let mut channels = self.channels.write();
        let channel = channels.entry(Arc::from(name)).or_insert_with(|| {
            debug!(host = %self.name, channel = name, "creating channel");
            Arc::new(Channel::new(name))
        });
        Ok(channel.clone())
    }

    /// Look up an existing channel. Never creates one.
    pub fn lookup(&self, name: &str) -> Result<Arc<Channel>, Fault> {
        if !self.provides_channels {
            return Err(Fault::ChannelMissing(name.to_string()));
        }
        self.channels
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Fault::ChannelMissing(name.to_string()))
    }

    pub fn channel_count(&self) -> usize {
        self.channels.read().len()
    }

    /// Run the teardown sweep over every channel: all subscribers are
    /// removed and their `close` hooks invoked.
    pub fn shutdown(&self) {
        // Collect first; close hooks may look channels up again.
        let channels: Vec<Arc<Channel>> = self.channels.read().values().cloned().collect();
        info!(host = %self.name, channels = channels.len(), "host teardown sweep");
        for channel in channels {
            channel.close_all();
        }
    }

    /// On Ctrl+C, run [`shutdown`](Self::shutdown) and exit the process
    /// with [`INTERRUPT_EXIT_CODE`].
    ///
    /// Only one interrupt handler can be installed per process.
    pub fn teardown_on_interrupt(self: &Arc<Self>) -> io::Result<()> {
        self.teardown_on_interrupt_then(|| std::process::exit(INTERRUPT_EXIT_CODE))
    }

    /// On Ctrl+C, run [`shutdown`](Self::shutdown) and then `then`. The
    /// process keeps running unless `then` ends it.
    pub fn teardown_on_interrupt_then<F>(self: &Arc<Self>, then: F) -> io::Result<()>
    where
        F: Fn() + Send + 'static,
    {
        ctrlc::set_handler(self.interrupt_handler(then)).map_err(|e| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to install interrupt handler: {e}"),
            )
        })
    }

    pub(crate) fn interrupt_handler<F>(
        self: &Arc<Self>,
        then: F,
    ) -> impl Fn() + Send + 'static
    where
        F: Fn() + Send + 'static,
    {
        let host = Arc::clone(self);
        move || {
            info!(host = %host.name, "interrupt received");
            host.shutdown();
            then();
        }
    }
}
