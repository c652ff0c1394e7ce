//! Broker adapters delivering user-creation events.

mod channel;
#[cfg(feature = "kafka")]
mod kafka;

pub use channel::{ChannelEventPublisher, ChannelEventSource};
#[cfg(feature = "kafka")]
pub use kafka::KafkaEventSource;

/// Connection parameters for the Kafka creation topic.
///
/// Always available so configuration can be parsed and reported even when
/// the binary is built without the `kafka` feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaSourceConfig {
    /// Comma-separated `host:port` list.
    pub brokers: String,
    pub group_id: String,
    pub topic: String,
}
