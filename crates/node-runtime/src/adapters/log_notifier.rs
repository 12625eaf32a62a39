//! # Log Notifier
//!
//! Silent termination: the finished token is only written to the log.

use async_trait::async_trait;
use tracing::info;

use relay_engine::{NodeIdentity, Notifier, NotifyError, Token};

/// Notifier that records the end of a traversal in the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, node: NodeIdentity, token: &Token) -> Result<(), NotifyError> {
        info!(node = %node, token = %token, "[node-{}] Traversal finished", node);
        Ok(())
    }
}
