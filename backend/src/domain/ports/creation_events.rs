//! Port for the broker subscription that delivers user-creation events.
//!
//! Partition assignment and offset bookkeeping belong to the adapter; the
//! domain sees one ordered stream of raw messages for a single topic.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by broker adapters.
    pub enum EventSourceError {
        /// The broker connection or subscription could not be established.
        Connection { message: String } => "event source connection failed: {message}",
        /// Receiving or acknowledging a message failed.
        Receive { message: String } => "event source receive failed: {message}",
    }
}

/// Raw message as delivered by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub payload: Vec<u8>,
}

/// Subscription to the user-creation topic under one consumer group.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CreationEventSource: Send + Sync {
    /// Wait for the next message. `Ok(None)` means the stream has ended.
    async fn recv(&self) -> Result<Option<CreationMessage>, EventSourceError>;

    /// Mark a message as handled so the group does not redeliver it.
    async fn commit(&self, message: &CreationMessage) -> Result<(), EventSourceError>;
}
