//! Forwarding of submissions to the broker.

use std::sync::Arc;

use thiserror::Error;

use crate::kafka::message::WalletAddressSet;
use crate::kafka::producer::{Producer, TransportError};

/// Why a forward did not reach the broker.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The payload could not be encoded. Never expected for decoded input.
    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Publishing failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Serializes payloads and publishes them through a shared producer.
#[derive(Clone)]
pub struct MessageForwarder {
    producer: Arc<dyn Producer>,
}

impl MessageForwarder {
    pub fn new(producer: Arc<dyn Producer>) -> Self {
        Self { producer }
    }

    /// Publish `payload` as exactly one message. Never retries.
    pub async fn forward(&self, payload: &WalletAddressSet) -> Result<(), ForwardError> {
        let value = payload.to_json()?;
        self.producer.publish(value).await?;
        Ok(())
    }

    /// Close the producer connection.
    pub async fn close(&self) {
        self.producer.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::BoxFuture;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProducer {
        published: Mutex<Vec<Vec<u8>>>,
        closed: AtomicBool,
    }

    impl Producer for RecordingProducer {
        fn publish(&self, value: Vec<u8>) -> BoxFuture<'_, Result<(), TransportError>> {
            Box::pin(async move {
                if self.closed.load(Ordering::SeqCst) {
                    return Err(TransportError::Closed);
                }
                self.published.lock().unwrap().push(value);
                Ok(())
            })
        }

        fn close(&self) -> BoxFuture<'_, ()> {
            Box::pin(async move { self.closed.store(true, Ordering::SeqCst) })
        }
    }

    #[tokio::test]
    async fn forward_publishes_one_encoded_message() {
        let producer = Arc::new(RecordingProducer::default());
        let forwarder = MessageForwarder::new(producer.clone());

        let mut payload = WalletAddressSet::new();
        payload.insert("key", vec!["addr".into()]);
        forwarder.forward(&payload).await.unwrap();

        let published = producer.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(WalletAddressSet::from_json(&published[0]).unwrap(), payload);
    }

    #[tokio::test]
    async fn forward_after_close_is_a_transport_error() {
        let producer = Arc::new(RecordingProducer::default());
        let forwarder = MessageForwarder::new(producer.clone());
        forwarder.close().await;

        let err = forwarder.forward(&WalletAddressSet::new()).await.unwrap_err();
        assert!(matches!(err, ForwardError::Transport(TransportError::Closed)));
        assert_eq!(err.to_string(), "producer is closed");
        assert!(producer.published.lock().unwrap().is_empty());
    }
}
