//! # Bus Messages
//!
//! A message is a topic name plus an opaque payload. The bus never looks
//! inside the payload.

/// A message travelling through the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    /// Topic the message was published to.
    pub topic: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

impl BusMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Exact-match topic filter. No wildcards: a node only ever listens on
/// its own topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicFilter {
    topic: String,
}

impl TopicFilter {
    /// Create a filter for a single topic.
    #[must_use]
    pub fn topic(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }

    /// Topic this filter accepts.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.topic
    }

    /// Check if a message matches this filter.
    #[must_use]
    pub fn matches(&self, message: &BusMessage) -> bool {
        self.topic == message.topic
    }
}
