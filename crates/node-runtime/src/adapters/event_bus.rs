//! # Event Bus Adapter
//!
//! Runs the relay protocol over the in-process [`InMemoryBus`]. Used by the
//! local mesh mode and by the test suites in place of a broker.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use relay_engine::{Topic, TokenPublisher, TransportError};
use shared_bus::{BusMessage, InMemoryBus, MessagePublisher, TopicFilter};

/// [`TokenPublisher`] backed by the shared bus.
#[derive(Clone)]
pub struct BusTransport {
    bus: Arc<InMemoryBus>,
}

impl BusTransport {
    pub fn new(bus: Arc<InMemoryBus>) -> Self {
        Self { bus }
    }

    /// Subscribe to `topic` and forward its payloads into an inbox.
    ///
    /// The subscription exists when this returns, so messages published
    /// afterwards are never missed.
    pub fn spawn_inbox(
        &self,
        topic: &Topic,
        capacity: usize,
    ) -> (mpsc::Receiver<Vec<u8>>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity);
        let mut stream = self.bus.message_stream(TopicFilter::topic(topic.as_str()));

        let handle = tokio::spawn(async move {
            while let Some(message) = stream.next().await {
                if tx.send(message.payload).await.is_err() {
                    debug!("Inbox closed, dropping bus subscription");
                    break;
                }
            }
        });

        (rx, handle)
    }
}

#[async_trait]
impl TokenPublisher for BusTransport {
    async fn publish(&self, topic: &Topic, payload: Vec<u8>) -> Result<(), TransportError> {
        let delivered = self
            .bus
            .publish(BusMessage::new(topic.as_str(), payload))
            .await;

        // At-most-once: nobody listening is not a send failure.
        if delivered == 0 {
            warn!(topic = %topic, "No subscriber on topic, message lost");
        }
        Ok(())
    }
}
