//! # Service Container
//!
//! Holds the shared adapters of a node process and builds relay services
//! on top of them.
//!
//! ## Wiring
//!
//! ```text
//! NodeConfig ──→ ServiceContainer ──┬── codec     (BarcodeCodec)
//!                                   ├── notifier  (LogNotifier | SendGridNotifier)
//!                                   └── relay_service(relay, publisher) ──→ RelayService
//! ```
//!
//! The publisher is supplied per service because it only exists once the
//! transport is connected.

use std::sync::Arc;

use tracing::{info, instrument};

use relay_engine::{Notifier, RelayConfig, RelayService, TokenCodec, TokenPublisher};

use crate::adapters::{BarcodeCodec, LogNotifier, SendGridNotifier};
use crate::container::config::{ConfigError, NodeConfig, NotifierConfig};

/// Shared adapters for every relay service in the process.
pub struct ServiceContainer {
    /// Node configuration (immutable after initialization).
    pub config: NodeConfig,
    codec: Arc<dyn TokenCodec>,
    notifier: Arc<dyn Notifier>,
}

impl ServiceContainer {
    /// Validate the configuration and build the production adapters.
    #[instrument(name = "container_init", skip(config), fields(node = %config.relay.node))]
    pub fn new(config: NodeConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let codec: Arc<dyn TokenCodec> = Arc::new(BarcodeCodec::new());
        let notifier: Arc<dyn Notifier> = match &config.notifier {
            NotifierConfig::Log => {
                info!("Terminal notification: log only");
                Arc::new(LogNotifier)
            }
            NotifierConfig::SendGrid(sendgrid) => {
                info!(to = %sendgrid.to_email, "Terminal notification: SendGrid email");
                Arc::new(SendGridNotifier::new(sendgrid.clone(), Arc::clone(&codec))?)
            }
        };

        Ok(Self {
            config,
            codec,
            notifier,
        })
    }

    /// Container with caller-supplied adapters.
    pub fn with_parts(
        config: NodeConfig,
        codec: Arc<dyn TokenCodec>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            codec,
            notifier,
        }
    }

    pub fn codec(&self) -> Arc<dyn TokenCodec> {
        Arc::clone(&self.codec)
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.notifier)
    }

    /// Relay service for `relay` publishing through `publisher`.
    pub fn relay_service(
        &self,
        relay: RelayConfig,
        publisher: Arc<dyn TokenPublisher>,
    ) -> Arc<RelayService> {
        Arc::new(RelayService::new(relay, publisher, self.notifier()))
    }
}
