//! Configuration for the relay engine
//!
//! Built once at startup and handed to [`RelayService`](crate::RelayService)
//! by value. Nothing reads process-wide state after that.

use crate::domain::addressing::{Topic, TopicTemplate};
use crate::domain::node::NodeIdentity;
use crate::domain::token::ProtocolVariant;
use serde::{Deserialize, Serialize};

/// Relay configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Identity of this node.
    pub node: NodeIdentity,
    /// Token layout shared by the whole deployment.
    #[serde(default)]
    pub variant: ProtocolVariant,
    /// Topic naming shared by the whole deployment.
    #[serde(default)]
    pub topics: TopicTemplate,
}

impl RelayConfig {
    /// Default variant and topic template for `node`.
    pub fn new(node: NodeIdentity) -> Self {
        Self {
            node,
            variant: ProtocolVariant::default(),
            topics: TopicTemplate::default(),
        }
    }

    #[must_use]
    pub fn with_variant(mut self, variant: ProtocolVariant) -> Self {
        self.variant = variant;
        self
    }

    #[must_use]
    pub fn with_topics(mut self, topics: TopicTemplate) -> Self {
        self.topics = topics;
        self
    }

    /// Topic this node subscribes to.
    pub fn own_topic(&self) -> Topic {
        self.topics.address_for(self.node)
    }
}
