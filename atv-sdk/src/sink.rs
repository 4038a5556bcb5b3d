//! Where channel updates go

use tracing::info;

/// Receives channel updates from a session
///
/// Called while the session state lock is held: implementations must not
/// call back into the session.
pub trait ChannelStateSink: Send + Sync {
    fn publish(&self, channel_id: &str, value: &str);
}

impl<F> ChannelStateSink for F
where
    F: Fn(&str, &str) + Send + Sync,
{
    fn publish(&self, channel_id: &str, value: &str) {
        self(channel_id, value)
    }
}

/// Sink that logs every update at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ChannelStateSink for TracingSink {
    fn publish(&self, channel_id: &str, value: &str) {
        info!(channel = channel_id, "{}", value);
    }
}
