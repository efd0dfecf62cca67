// A named, synchronous, in-process publish/subscribe path.
//
// publish() runs every subscriber on the calling thread before it returns.
// There is no queue and no dispatcher thread.

use super::message::Message;
use crate::error::Fault;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Something registered on a [`Channel`].
pub trait Subscriber: Send + Sync {
    /// Handle one published message. May rewrite the message parameters in
    /// place. An error aborts the publish and is returned to the publisher.
    fn publish(&self, message: &Message) -> Result<(), Fault>;

    /// Called by the host's teardown sweep after the subscriber has been
    /// removed from `channel`.
    fn close(self: Arc<Self>, channel: &Channel) {
        let _ = channel;
    }
}

pub struct Channel {
    pub(crate) name: Arc<str>,
    pub(crate) subscribers: RwLock<Vec<Arc<dyn Subscriber>>>,
}

impl Channel {
    pub(crate) fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        self.subscribers.write().push(subscriber);
    }

    /// Remove `subscriber` (matched by identity).
    /// Returns whether it was registered.
    pub fn unsubscribe(&self, subscriber: &Arc<dyn Subscriber>) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| !Arc::ptr_eq(s, subscriber));
        subscribers.len() != before
    }

    pub fn is_subscribed(&self, subscriber: &Arc<dyn Subscriber>) -> bool {
        self.subscribers
            .read()
            .iter()
            .any(|s| Arc::ptr_eq(s, subscriber))
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Deliver `message` to every subscriber, in registration order, on the
    /// calling thread. The first subscriber error stops delivery.
    ///
    /// The subscriber list is copied out first so subscribers may register or
    /// unregister while being invoked.
    pub fn publish(&self, message: &Message) -> Result<(), Fault> {
        let subscribers = self.subscribers.read().clone();
        for subscriber in subscribers.iter() {
            subscriber.publish(message)?;
        }
        Ok(())
    }

    /// Teardown sweep: drop every subscriber, then let each one react through
    /// its `close` hook. No lock is held while hooks run, so a hook may
    /// subscribe again.
    pub fn close_all(&self) {
        let drained = std::mem::take(&mut *self.subscribers.write());
        debug!(channel = %self.name, closed = drained.len(), "closing channel subscribers");
        for subscriber in drained {
            subscriber.close(self);
        }
    }
}
