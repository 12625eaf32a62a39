//! # Hop Address Resolution
//!
//! Maps a [`NodeIdentity`] to the topic that node subscribes to. Publishers
//! and subscribers on different machines must agree on the template, so it
//! is deployment configuration and never travels with the token.

use super::errors::RelayError;
use super::node::NodeIdentity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder replaced by the node identity.
pub const NODE_PLACEHOLDER: &str = "{node}";

/// Topic template used when none is configured.
pub const DEFAULT_TOPIC_TEMPLATE: &str = "PATRONES2024/GRUPO{node}";

/// A concrete topic name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Topic(String);

impl Topic {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Template of the form `<prefix>{node}<suffix>`.
///
/// The placeholder must appear exactly once; since identities are single
/// digits, fixed text around it keeps the mapping injective.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TopicTemplate {
    prefix: String,
    suffix: String,
}

impl TopicTemplate {
    /// Parse a template string.
    pub fn parse(template: &str) -> Result<Self, RelayError> {
        let invalid = |reason| RelayError::InvalidTopicTemplate {
            template: template.to_string(),
            reason,
        };

        if template.matches(NODE_PLACEHOLDER).count() != 1 {
            return Err(invalid("placeholder {node} must appear exactly once"));
        }
        // MQTT wildcards would make one publish reach several nodes.
        if template.contains(['+', '#']) {
            return Err(invalid("wildcards '+' and '#' are not allowed"));
        }

        let (prefix, suffix) = template
            .split_once(NODE_PLACEHOLDER)
            .ok_or_else(|| invalid("placeholder {node} must appear exactly once"))?;

        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// Topic for a node.
    #[must_use]
    pub fn address_for(&self, node: NodeIdentity) -> Topic {
        Topic(format!("{}{}{}", self.prefix, node, self.suffix))
    }
}

impl Default for TopicTemplate {
    fn default() -> Self {
        Self {
            prefix: "PATRONES2024/GRUPO".to_string(),
            suffix: String::new(),
        }
    }
}

impl TryFrom<String> for TopicTemplate {
    type Error = RelayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TopicTemplate> for String {
    fn from(template: TopicTemplate) -> Self {
        template.to_string()
    }
}

impl fmt::Display for TopicTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.prefix, NODE_PLACEHOLDER, self.suffix)
    }
}
