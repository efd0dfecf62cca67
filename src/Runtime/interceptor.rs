// The channel subscriber that resolves unit ids to records.

use super::lifecycle::{LifecycleState, Registration};
use crate::error::Fault;
use crate::Channel::channel::{Channel, Subscriber};
use crate::Channel::message::{Message, Value};
use crate::Core::store::RecordStore;
use std::sync::Arc;
use tracing::warn;

/// Answers accessor routines published under its runtime's key.
///
/// Messages with any other key pass through untouched: the channel may be
/// shared with unrelated traffic or with other runtime instances.
pub struct Interceptor {
    pub(crate) key: Arc<str>,
    pub(crate) store: Arc<dyn RecordStore>,
    pub(crate) registration: Arc<Registration>,
}

impl Interceptor {
    pub(crate) fn new(
        key: Arc<str>,
        store: Arc<dyn RecordStore>,
        registration: Arc<Registration>,
    ) -> Self {
        Self {
            key,
            store,
            registration,
        }
    }
}

impl Subscriber for Interceptor {
    fn publish(&self, message: &Message) -> Result<(), Fault> {
        if message.key() != &*self.key {
            return Ok(());
        }

        let params = message.params();
        let id = match params.get(0)? {
            Value::Boxed(id) | Value::Long(id) => id,
            other => {
                return Err(Fault::UnexpectedPayload {
                    expected: "unit id",
                    found: other.kind(),
                })
            }
        };

        let record = self.store.get(id).ok_or(Fault::UnknownUnitId(id))?;
        params.set(0, Value::Record(record))
    }

    // The host sweep removes every subscriber at shutdown, but units that
    // initialize during the rest of the sweep still need the channel. While
    // the runtime is Active we put ourselves straight back.
    fn close(self: Arc<Self>, channel: &Channel) {
        let _transition = self.registration.transition.lock();
        if self.registration.state.load() == LifecycleState::Active {
            warn!(
                channel = channel.name(),
                "interceptor removed by host teardown while active, re-registering"
            );
            channel.subscribe(self.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Channel::message::ArrayRef;
    use crate::Core::store::{Probes, ProbeStore};

    fn interceptor(store: Arc<ProbeStore>) -> Interceptor {
        Interceptor::new(Arc::from("key"), store, Arc::new(Registration::new()))
    }

    #[test]
    fn matching_key_swaps_id_for_record() {
        let store = Arc::new(ProbeStore::new());
        let record = store.insert(3, Probes::new(2));
        let params = ArrayRef::new(1);
        params.set(0, Value::Boxed(3)).unwrap();

        interceptor(store)
            .publish(&Message::new("key", params.clone()))
            .unwrap();

        match params.get(0).unwrap() {
            Value::Record(r) => assert!(Arc::ptr_eq(&r, &record)),
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn foreign_key_is_ignored() {
        let store = Arc::new(ProbeStore::new());
        let params = ArrayRef::new(1);
        params.set(0, Value::Boxed(3)).unwrap();

        interceptor(store)
            .publish(&Message::new("other", params.clone()))
            .unwrap();

        assert!(matches!(params.get(0), Ok(Value::Boxed(3))));
    }

    #[test]
    fn non_id_payload_is_rejected() {
        let store = Arc::new(ProbeStore::new());
        let params = ArrayRef::new(1);
        params.set(0, Value::Str(Arc::from("3"))).unwrap();

        let err = interceptor(store)
            .publish(&Message::new("key", params))
            .unwrap_err();

        assert_eq!(
            err,
            Fault::UnexpectedPayload {
                expected: "unit id",
                found: "string"
            }
        );
    }

    #[test]
    fn close_while_created_does_not_resubscribe() {
        let channel = Channel::new("c");
        let sub = Arc::new(interceptor(Arc::new(ProbeStore::new())));
        channel.subscribe(sub);

        channel.close_all();

        assert_eq!(channel.subscriber_count(), 0);
    }
}
