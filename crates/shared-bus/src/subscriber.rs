//! # Message Subscriber
//!
//! Defines the subscription side of the bus.

use crate::events::{BusMessage, TopicFilter};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::task::{ready, Context, Poll};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::debug;

/// Live subscription count per topic.
#[derive(Clone, Default)]
pub(crate) struct SubscriptionRegistry {
    entries: Arc<RwLock<HashMap<String, usize>>>,
}

impl SubscriptionRegistry {
    pub(crate) fn register(&self, filter: &TopicFilter) -> SubscriptionGuard {
        let topic = filter.as_str().to_string();
        if let Ok(mut entries) = self.entries.write() {
            *entries.entry(topic.clone()).or_insert(0) += 1;
        }
        SubscriptionGuard {
            registry: self.clone(),
            topic,
        }
    }

    pub(crate) fn matching(&self, topic: &str) -> usize {
        self.entries
            .read()
            .map(|entries| entries.get(topic).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

/// Removes its subscription from the registry when dropped.
pub(crate) struct SubscriptionGuard {
    registry: SubscriptionRegistry,
    topic: String,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        let Ok(mut entries) = self.registry.entries.write() else {
            return;
        };
        if let Some(count) = entries.get_mut(&self.topic) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                entries.remove(&self.topic);
            }
        }
        debug!(topic = %self.topic, "Subscription dropped");
    }
}

/// A stream of messages matching a filter.
///
/// Implements `tokio_stream::Stream` for use with stream combinators.
/// The subscription is released when the stream is dropped.
pub struct MessageStream {
    inner: BroadcastStream<BusMessage>,
    filter: TopicFilter,
    _guard: SubscriptionGuard,
}

impl MessageStream {
    pub(crate) fn new(
        receiver: broadcast::Receiver<BusMessage>,
        filter: TopicFilter,
        guard: SubscriptionGuard,
    ) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
            filter,
            _guard: guard,
        }
    }
}

impl Stream for MessageStream {
    type Item = BusMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                Some(Ok(message)) if self.filter.matches(&message) => {
                    return Poll::Ready(Some(message))
                }
                Some(Ok(_)) => continue,
                Some(Err(BroadcastStreamRecvError::Lagged(count))) => {
                    debug!(lagged = count, "Stream lagged, some messages dropped");
                    continue;
                }
                None => return Poll::Ready(None),
            }
        }
    }
}
