//! # Relay Handler
//!
//! Drains a node's transport inbox into the relay service.
//!
//! ## Flow
//!
//! 1. Transport task pushes each payload on the node topic into the inbox
//! 2. Handler acquires a permit (at most `max_in_flight` deliveries per node)
//! 3. One task per payload runs `RelayApi::relay`
//! 4. A fatal error (malformed token, counter overflow) stops the handler;
//!    transport and notification failures are logged and the node stays idle
//! 5. On stop, in-flight deliveries get a grace period, then are aborted

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use relay_engine::{HopReport, NodeIdentity, RelayApi, RelayError};

/// How long a stopping handler waits for in-flight deliveries.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Handler consuming one node's inbox.
pub struct RelayHandler {
    node: NodeIdentity,
    api: Arc<dyn RelayApi>,
    limit: Arc<Semaphore>,
    grace: Duration,
}

impl RelayHandler {
    pub fn new(node: NodeIdentity, api: Arc<dyn RelayApi>, max_in_flight: usize) -> Self {
        Self {
            node,
            api,
            limit: Arc::new(Semaphore::new(max_in_flight.max(1))),
            grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    /// Bound the wait for in-flight deliveries once the handler stops.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Run until shutdown, inbox close, or the first fatal error.
    ///
    /// Deliveries already in flight get the shutdown grace period to finish
    /// and are aborted after it.
    pub async fn run(
        self,
        mut inbox: mpsc::Receiver<Vec<u8>>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), RelayError> {
        let node = self.node;
        info!("[node-{}] Relay handler started", node);

        let mut tasks: JoinSet<Result<HopReport, RelayError>> = JoinSet::new();
        // A payload is only taken from the inbox once a slot is held, so a
        // full node never parks inside a select arm.
        let mut permit: Option<OwnedSemaphorePermit> = None;

        let stop = shutdown_requested(&mut shutdown);
        tokio::pin!(stop);

        loop {
            tokio::select! {
                biased;

                _ = &mut stop => {
                    info!("[node-{}] Shutdown signal received", node);
                    break;
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    settle(node, joined)?;
                }
                acquired = Arc::clone(&self.limit).acquire_owned(), if permit.is_none() => {
                    permit = Some(acquired.map_err(|e| RelayError::Internal(e.to_string()))?);
                }
                payload = inbox.recv(), if permit.is_some() => {
                    let Some(payload) = payload else {
                        info!("[node-{}] Inbox closed, exiting", node);
                        break;
                    };

                    let held = permit.take();
                    let api = Arc::clone(&self.api);
                    tasks.spawn(async move {
                        let _permit = held;
                        api.relay(&payload).await
                    });
                }
            }
        }

        let drained = tokio::time::timeout(self.grace, async {
            while let Some(joined) = tasks.join_next().await {
                settle(node, joined)?;
            }
            Ok::<(), RelayError>(())
        })
        .await;

        match drained {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    "[node-{}] Aborting {} deliveries still running after {:?}",
                    node,
                    tasks.len(),
                    self.grace
                );
                tasks.shutdown().await;
            }
        }

        info!("[node-{}] Relay handler stopped", node);
        Ok(())
    }
}

/// Resolves once shutdown is signalled or the signal sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Fold one finished delivery into the handler result.
fn settle(
    node: NodeIdentity,
    joined: Result<Result<HopReport, RelayError>, JoinError>,
) -> Result<(), RelayError> {
    match joined {
        Ok(Ok(report)) => {
            debug!(?report, "[node-{}] Delivery handled", node);
            Ok(())
        }
        Ok(Err(e)) if e.is_fatal() => {
            error!("[node-{}] Fatal relay error: {}", node, e);
            Err(e)
        }
        Ok(Err(e)) => {
            warn!("[node-{}] Delivery failed, staying idle: {}", node, e);
            Ok(())
        }
        Err(e) => Err(RelayError::Internal(format!("delivery task failed: {e}"))),
    }
}
