//! Error types for the relay engine
//!
//! Reaching the end of a route is not an error: it is
//! [`RelayOutcome::Terminate`](crate::domain::outcome::RelayOutcome::Terminate).

use thiserror::Error;

/// All errors that can occur while evaluating or dispatching a token.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Token violates the structural invariant (non-digit route, bad suffix).
    #[error("Malformed token {token:?}: {reason}")]
    MalformedToken { token: String, reason: String },

    /// Incrementing the counter would not fit the fixed width.
    #[error("Counter overflow: {value} + 1 does not fit in {width} digits")]
    CounterOverflow { value: u32, width: usize },

    /// Node identity outside the single-digit range.
    #[error("Invalid node identity {0}: must be between 1 and 9")]
    InvalidNodeIdentity(u32),

    /// Topic template cannot produce an injective node address.
    #[error("Invalid topic template {template:?}: {reason}")]
    InvalidTopicTemplate {
        template: String,
        reason: &'static str,
    },

    /// Publishing, subscribing or connecting failed.
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// Terminal notification could not be delivered.
    #[error("Notification failure: {0}")]
    Notification(#[from] NotifyError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Whether the error must stop the node process.
    ///
    /// A token that is malformed or whose counter overflowed can never be
    /// forwarded by any node, so the traversal is dead.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken { .. } | Self::CounterOverflow { .. } | Self::Internal(_)
        )
    }

    pub(crate) fn malformed(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedToken {
            token: token.into(),
            reason: reason.into(),
        }
    }
}

/// Transport errors reported by a [`TokenPublisher`](crate::ports::outbound::TokenPublisher)
/// or a subscription.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Failed to connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("Failed to subscribe to {topic}: {reason}")]
    Subscribe { topic: String, reason: String },

    #[error("Failed to publish to {topic}: {reason}")]
    Publish { topic: String, reason: String },
}

/// Barcode codec errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Failed to decode barcode: {0}")]
    Decode(String),

    #[error("Failed to render barcode: {0}")]
    Encode(String),
}

/// Notifier errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to render token: {0}")]
    Render(#[from] CodecError),

    #[error("Notification request failed: {0}")]
    Request(String),

    #[error("Notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
