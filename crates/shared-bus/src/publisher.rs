//! # Message Publisher
//!
//! Defines the publishing side of the bus.

use crate::events::{BusMessage, TopicFilter};
use crate::subscriber::{MessageStream, SubscriptionRegistry};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing messages to the bus.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish a message to the bus.
    ///
    /// # Returns
    ///
    /// The number of subscriptions whose filter accepts the message.
    async fn publish(&self, message: BusMessage) -> usize;
}

/// In-memory implementation of the bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer semantics;
/// topic selection happens on the receiving side.
pub struct InMemoryBus {
    /// Broadcast sender for messages.
    sender: broadcast::Sender<BusMessage>,

    /// Active subscriptions by topic.
    subscriptions: SubscriptionRegistry,
}

impl InMemoryBus {
    /// Create a new in-memory bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self {
            sender,
            subscriptions: SubscriptionRegistry::default(),
        }
    }

    /// Get a stream of messages matching a filter.
    ///
    /// The subscription exists when this returns.
    #[must_use]
    pub fn message_stream(&self, filter: TopicFilter) -> MessageStream {
        let receiver = self.sender.subscribe();
        let guard = self.subscriptions.register(&filter);

        debug!(topic = %filter.as_str(), "New subscription created");

        MessageStream::new(receiver, filter, guard)
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePublisher for InMemoryBus {
    async fn publish(&self, message: BusMessage) -> usize {
        let topic = message.topic.clone();
        let matching = self.subscriptions.matching(&topic);

        match self.sender.send(message) {
            Ok(receiver_count) => {
                debug!(
                    topic = %topic,
                    receivers = receiver_count,
                    matching = matching,
                    "Message published"
                );
                matching
            }
            Err(e) => {
                // No receivers - message is dropped
                warn!(topic = %topic, error = %e, "Message dropped (no receivers)");
                0
            }
        }
    }
}
