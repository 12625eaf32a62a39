//! Relay Service
//!
//! Main service implementing [`RelayApi`].
//!
//! ## State Machine (per traversal)
//!
//! ```text
//!            originate()               relay()
//!   Idle ──────────────→ Originating   Idle ──────→ Relaying
//!                            │                          │
//!                            └────────┬─────────────────┘
//!                                     ▼
//!                          evaluate(token, node)
//!                           │                 │
//!                     Forward(next)       Terminate
//!                           │                 │
//!                    publish(next topic)   notify(token)
//!                           └───────→ Idle ←──┘
//! ```
//!
//! The service keeps no per-traversal state; every call owns its token.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::algorithms::{evaluate, is_origin};
use crate::config::RelayConfig;
use crate::domain::addressing::Topic;
use crate::domain::errors::RelayError;
use crate::domain::invariants;
use crate::domain::outcome::{HopReport, RelayOutcome};
use crate::domain::token::Token;
use crate::ports::inbound::RelayApi;
use crate::ports::outbound::{Notifier, TokenPublisher};

/// Relay Service
///
/// Orchestrates one hop:
/// 1. Parse the token (relay only)
/// 2. Evaluate it against this node
/// 3. Publish to the next hop or notify
pub struct RelayService {
    config: RelayConfig,
    publisher: Arc<dyn TokenPublisher>,
    notifier: Arc<dyn Notifier>,
}

impl RelayService {
    pub fn new(
        config: RelayConfig,
        publisher: Arc<dyn TokenPublisher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            publisher,
            notifier,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Topic this node listens on.
    pub fn topic(&self) -> Topic {
        self.config.own_topic()
    }

    /// Parse a decoded barcode under the configured variant.
    pub fn parse_token(&self, raw: &str) -> Result<Token, RelayError> {
        Token::parse(raw, self.config.variant)
    }

    async fn dispatch(
        &self,
        received: &Token,
        outcome: RelayOutcome,
    ) -> Result<HopReport, RelayError> {
        let node = self.config.node;

        match outcome {
            RelayOutcome::Forward { next, token } => {
                debug_assert!(invariants::check_forward(received, &token));

                let topic = self.config.topics.address_for(next);
                self.publisher
                    .publish(&topic, token.to_wire())
                    .await
                    .inspect_err(|e| {
                        error!("[node-{}] Failed to publish to {}: {}", node, topic, e)
                    })?;

                info!(
                    next = %next,
                    token = %token,
                    "[node-{}] Message published to {:?}", node, topic.as_str()
                );
                Ok(HopReport::Forwarded { next, topic, token })
            }
            RelayOutcome::Terminate { token } => {
                info!(token = %token, "[node-{}] Last node, sending notification", node);

                self.notifier
                    .notify(node, &token)
                    .await
                    .inspect_err(|e| error!("[node-{}] Failed to notify: {}", node, e))?;

                Ok(HopReport::Terminated { token })
            }
        }
    }
}

#[async_trait]
impl RelayApi for RelayService {
    async fn originate(&self, token: Token) -> Result<HopReport, RelayError> {
        let node = self.config.node;

        if !is_origin(&token, node) {
            debug!(token = %token, "[node-{}] Not the origin, waiting for messages", node);
            return Ok(HopReport::Idle);
        }

        info!(token = %token, "[node-{}] Node is the publisher, starting traversal", node);
        let outcome = self.evaluate(&token)?;
        self.dispatch(&token, outcome).await
    }

    async fn relay(&self, payload: &[u8]) -> Result<HopReport, RelayError> {
        let node = self.config.node;

        let token = Token::from_payload(payload, self.config.variant)
            .inspect_err(|e| error!("[node-{}] Rejected payload: {}", node, e))?;
        info!(token = %token, "[node-{}] Received message", node);

        let outcome = self.evaluate(&token)?;
        self.dispatch(&token, outcome).await
    }

    fn evaluate(&self, token: &Token) -> Result<RelayOutcome, RelayError> {
        let outcome = evaluate(token, self.config.node)?;
        debug_assert!(invariants::invariant_terminal_unmutated(token, &outcome));
        Ok(outcome)
    }
}
