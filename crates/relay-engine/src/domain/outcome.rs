//! Relay outcomes

use super::addressing::Topic;
use super::node::NodeIdentity;
use super::token::Token;

/// Result of evaluating a token at a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Hand the already mutated token to `next`.
    Forward { next: NodeIdentity, token: Token },
    /// This node ends the route; `token` is exactly what was received.
    Terminate { token: Token },
}

/// What a node did with a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HopReport {
    /// Token published to the next hop.
    Forwarded {
        next: NodeIdentity,
        topic: Topic,
        token: Token,
    },
    /// Notifier invoked with the final token.
    Terminated { token: Token },
    /// Local token does not start at this node; nothing to do until a
    /// message arrives.
    Idle,
}

impl HopReport {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated { .. })
    }
}
