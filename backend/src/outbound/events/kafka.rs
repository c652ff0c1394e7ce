//! Kafka creation event source built on `rdkafka`.
//!
//! Subscribes one topic under one consumer group, starting from the oldest
//! retained offset when the group has no committed position. Offsets are
//! committed explicitly after each handled message.

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::{Offset, TopicPartitionList};
use tracing::info;

use crate::domain::ports::{CreationEventSource, CreationMessage, EventSourceError};

use super::KafkaSourceConfig;

/// [`CreationEventSource`] backed by an `rdkafka` stream consumer.
pub struct KafkaEventSource {
    consumer: StreamConsumer,
}

impl KafkaEventSource {
    /// Create the consumer and subscribe to the configured topic.
    pub fn subscribe(config: &KafkaSourceConfig) -> Result<Self, EventSourceError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .create()
            .map_err(|err| EventSourceError::connection(err.to_string()))?;
        consumer
            .subscribe(&[config.topic.as_str()])
            .map_err(|err| EventSourceError::connection(err.to_string()))?;
        info!(
            brokers = %config.brokers,
            group_id = %config.group_id,
            topic = %config.topic,
            "subscribed to creation topic"
        );
        Ok(Self { consumer })
    }
}

#[async_trait]
impl CreationEventSource for KafkaEventSource {
    async fn recv(&self) -> Result<Option<CreationMessage>, EventSourceError> {
        let message = self
            .consumer
            .recv()
            .await
            .map_err(|err| EventSourceError::receive(err.to_string()))?;
        Ok(Some(CreationMessage {
            topic: message.topic().to_owned(),
            partition: message.partition(),
            offset: message.offset(),
            payload: message.payload().unwrap_or_default().to_vec(),
        }))
    }

    async fn commit(&self, message: &CreationMessage) -> Result<(), EventSourceError> {
        let mut offsets = TopicPartitionList::new();
        offsets
            .add_partition_offset(
                &message.topic,
                message.partition,
                Offset::Offset(message.offset + 1),
            )
            .map_err(|err| EventSourceError::receive(err.to_string()))?;
        self.consumer
            .commit(&offsets, CommitMode::Async)
            .map_err(|err| EventSourceError::receive(err.to_string()))
    }
}
