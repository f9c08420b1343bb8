//! Producer connection to the broker.
//!
//! # Responsibilities
//! - Establish the authenticated broker connection at startup
//! - Publish one record per call to the configured topic/partition
//! - Release the connection explicitly at shutdown
//!
//! # Design Decisions
//! - `Producer` is the seam between the bridge and the broker client
//! - No retries; failures surface to the caller as `TransportError`
//! - The partition client is swapped out on close, so no lock is held while
//!   a publish is in flight

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::Utc;
use futures_util::future::BoxFuture;
use rskafka::client::partition::{Compression, PartitionClient, UnknownTopicHandling};
use rskafka::client::ClientBuilder;
use rskafka::record::Record;
use thiserror::Error;

use crate::config::KafkaConfig;

/// Failure to hand a message to the broker.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The producer was closed before the publish.
    #[error("producer is closed")]
    Closed,

    /// The broker client reported an error (network, rejection, auth).
    #[error(transparent)]
    Client(#[from] rskafka::client::error::Error),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Something that can publish opaque message values to a fixed destination.
pub trait Producer: Send + Sync {
    /// Publish `value` as a single message without a key.
    fn publish(&self, value: Vec<u8>) -> BoxFuture<'_, Result<(), TransportError>>;

    /// Release the underlying connection. Later publishes fail.
    fn close(&self) -> BoxFuture<'_, ()>;
}

/// Kafka producer bound to one topic and partition.
pub struct KafkaProducer {
    topic: String,
    partition: i32,
    client: ArcSwapOption<PartitionClient>,
}

impl KafkaProducer {
    /// Connect to the configured brokers over TLS.
    pub async fn connect(
        config: &KafkaConfig,
        tls: rustls::ClientConfig,
    ) -> Result<Self, TransportError> {
        tracing::info!(
            brokers = ?config.brokers,
            topic = %config.topic,
            partition = config.partition,
            "Connecting to Kafka"
        );

        let client = ClientBuilder::new(config.brokers.clone())
            .tls_config(Arc::new(tls))
            .build()
            .await?;
        let partition_client = client
            .partition_client(
                config.topic.clone(),
                config.partition,
                UnknownTopicHandling::Error,
            )
            .await?;

        tracing::info!(topic = %config.topic, "Kafka producer ready");
        Ok(Self {
            topic: config.topic.clone(),
            partition: config.partition,
            client: ArcSwapOption::from_pointee(partition_client),
        })
    }

}

impl Producer for KafkaProducer {
    fn publish(&self, value: Vec<u8>) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            let client = self.client.load_full().ok_or(TransportError::Closed)?;
            let record = Record {
                key: None,
                value: Some(value),
                headers: BTreeMap::new(),
                timestamp: Utc::now(),
            };
            client
                .produce(vec![record], Compression::NoCompression)
                .await?;
            Ok(())
        })
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if self.client.swap(None).is_some() {
                tracing::info!(
                    topic = %self.topic,
                    partition = self.partition,
                    "Kafka producer closed"
                );
            }
        })
    }
}
