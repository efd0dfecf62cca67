use crate::Channel::channel::Channel;
use crate::Channel::host::Host;
use crate::Channel::message::Message;
use crate::Runtime::interceptor::Interceptor;
use crate::Runtime::lifecycle::ProbeRuntime;
use std::fmt;

/// Debug function for ProbeRuntime
///
/// Shows:
/// - Runtime key and channel name
/// - Host name
/// - Lifecycle state and whether the interceptor is subscribed
pub fn debug_probe_runtime(runtime: &ProbeRuntime, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ProbeRuntime")
        .field("key", &runtime.key())
        .field("channel", &runtime.channel_name())
        .field("host", &runtime.host().name())
        .field("state", &runtime.state())
        .field("registered", &runtime.is_registered())
        .finish()
}

/// Debug function for Interceptor
///
/// The store is opaque; records are never printed.
pub fn debug_interceptor(interceptor: &Interceptor, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Interceptor")
        .field("key", &&*interceptor.key)
        .field("store", &"<opaque>")
        .field("state", &interceptor.registration.state.load())
        .finish()
}

pub fn debug_channel(channel: &Channel, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Channel")
        .field("name", &channel.name())
        .field("subscribers", &channel.subscriber_count())
        .finish()
}

pub fn debug_host(host: &Host, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut channels: Vec<String> = host
        .channels
        .read()
        .keys()
        .map(|name| name.to_string())
        .collect();
    channels.sort();
    f.debug_struct("Host")
        .field("name", &host.name())
        .field("provides_channels", &host.provides_channels())
        .field("channels", &channels)
        .finish()
}

/// Debug function for Message
///
/// Payloads may hold live records, so only the slot count is shown.
pub fn debug_message(message: &Message, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Message")
        .field("key", &message.key())
        .field("params", &format_args!("<{} slots>", message.params().len()))
        .finish()
}
