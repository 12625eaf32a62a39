//! Inbound Ports (Driving Ports / API)

use crate::domain::errors::RelayError;
use crate::domain::outcome::{HopReport, RelayOutcome};
use crate::domain::token::Token;
use async_trait::async_trait;

/// Primary relay API driven by the node runtime.
#[async_trait]
pub trait RelayApi: Send + Sync {
    /// Start a traversal from a locally decoded token.
    ///
    /// Returns [`HopReport::Idle`] when the token does not originate at
    /// this node.
    async fn originate(&self, token: Token) -> Result<HopReport, RelayError>;

    /// Handle a raw payload delivered on this node's topic.
    async fn relay(&self, payload: &[u8]) -> Result<HopReport, RelayError>;

    /// Evaluate without side effects.
    fn evaluate(&self, token: &Token) -> Result<RelayOutcome, RelayError>;
}
