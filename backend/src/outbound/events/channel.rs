//! In-process creation event source backed by a `tokio` mpsc channel.
//!
//! Used when no broker is configured and by tests. Offsets are assigned by
//! the publisher in send order, starting at zero.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use crate::domain::ports::{CreationEventSource, CreationMessage, EventSourceError};

const CHANNEL_TOPIC: &str = "users.creation";

/// Producer half handed to whoever feeds the channel.
#[derive(Debug, Clone)]
pub struct ChannelEventPublisher {
    sender: mpsc::Sender<CreationMessage>,
    next_offset: std::sync::Arc<AtomicI64>,
}

impl ChannelEventPublisher {
    /// Enqueue a raw payload, returning the offset it was assigned.
    pub async fn publish(&self, payload: Vec<u8>) -> Result<i64, EventSourceError> {
        let offset = self.next_offset.fetch_add(1, Ordering::SeqCst);
        self.sender
            .send(CreationMessage {
                topic: CHANNEL_TOPIC.to_owned(),
                partition: 0,
                offset,
                payload,
            })
            .await
            .map_err(|_| EventSourceError::connection("creation channel closed"))?;
        Ok(offset)
    }
}

/// Consumer half implementing [`CreationEventSource`].
#[derive(Debug)]
pub struct ChannelEventSource {
    receiver: Mutex<mpsc::Receiver<CreationMessage>>,
    committed: AtomicI64,
}

impl ChannelEventSource {
    /// Create a bounded channel and return both halves.
    pub fn new(capacity: usize) -> (ChannelEventPublisher, Self) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let publisher = ChannelEventPublisher {
            sender,
            next_offset: std::sync::Arc::new(AtomicI64::new(0)),
        };
        let source = Self {
            receiver: Mutex::new(receiver),
            committed: AtomicI64::new(-1),
        };
        (publisher, source)
    }

    /// Highest committed offset, if any message has been committed.
    pub fn committed_offset(&self) -> Option<i64> {
        let offset = self.committed.load(Ordering::SeqCst);
        (offset >= 0).then_some(offset)
    }
}

#[async_trait]
impl CreationEventSource for ChannelEventSource {
    async fn recv(&self) -> Result<Option<CreationMessage>, EventSourceError> {
        Ok(self.receiver.lock().await.recv().await)
    }

    async fn commit(&self, message: &CreationMessage) -> Result<(), EventSourceError> {
        self.committed.fetch_max(message.offset, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn delivers_in_publish_order_with_offsets() {
        let (publisher, source) = ChannelEventSource::new(4);
        publisher.publish(b"first".to_vec()).await.expect("publish");
        publisher.publish(b"second".to_vec()).await.expect("publish");

        let first = source.recv().await.expect("recv").expect("message");
        let second = source.recv().await.expect("recv").expect("message");

        assert_eq!((first.offset, first.payload.as_slice()), (0, &b"first"[..]));
        assert_eq!((second.offset, second.payload.as_slice()), (1, &b"second"[..]));
    }

    #[rstest]
    #[tokio::test]
    async fn stream_ends_when_publishers_are_dropped() {
        let (publisher, source) = ChannelEventSource::new(1);
        drop(publisher);

        assert_eq!(source.recv().await.expect("recv"), None);
    }

    #[rstest]
    #[tokio::test]
    async fn commit_tracks_highest_offset() {
        let (publisher, source) = ChannelEventSource::new(2);
        assert_eq!(source.committed_offset(), None);
        publisher.publish(Vec::new()).await.expect("publish");
        let message = source.recv().await.expect("recv").expect("message");

        source.commit(&message).await.expect("commit");

        assert_eq!(source.committed_offset(), Some(0));
    }
}
