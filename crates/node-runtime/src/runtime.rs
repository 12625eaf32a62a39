//! # Node Runtime
//!
//! Startup, run and shutdown of a relay process.
//!
//! ## Startup Sequence
//!
//! 1. Read and decode the barcode image, parse the token
//! 2. Connect the transport and subscribe every local node to its topic
//! 3. Start one relay handler per local node
//! 4. Originate the traversal (nodes that are not the origin stay idle)
//! 5. Run until the shutdown signal or the first fatal relay error
//!
//! Subscriptions are in place before any node originates, so a local mesh
//! never loses the first hop.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::{watch, Notify};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use relay_engine::{
    HopReport, NodeIdentity, Notifier, NotifyError, RelayApi, RelayConfig, RelayError,
    RelayService, Token, TokenPublisher,
};
use shared_bus::InMemoryBus;

use crate::adapters::{BusTransport, MqttTransport};
use crate::container::config::TransportMode;
use crate::container::ServiceContainer;
use crate::handlers::RelayHandler;

/// The relay process: one node over MQTT or a local mesh over the bus.
pub struct NodeRuntime {
    container: Arc<ServiceContainer>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl NodeRuntime {
    pub fn new(container: ServiceContainer) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            container: Arc::new(container),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Read the configured image and turn it into a token.
    pub async fn load_token(&self) -> Result<Token> {
        let config = &self.container.config;
        let node = config.relay.node;

        let image = tokio::fs::read(&config.image_path)
            .await
            .with_context(|| format!("Failed to read image {}", config.image_path.display()))?;
        let raw = self
            .container
            .codec()
            .decode(&image)
            .with_context(|| format!("Failed to decode barcode {}", config.image_path.display()))?;
        info!("[node-{}] Decoded barcode: {}", node, raw);

        Token::parse(&raw, config.relay.variant).context("Barcode does not hold a relay token")
    }

    /// Run until `signal` resolves or a node hits a fatal error.
    ///
    /// In local mesh mode the run also ends once the traversal terminates.
    pub async fn run_until<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let token = self.load_token().await?;

        match self.container.config.transport.mode {
            TransportMode::Mqtt => self.run_mqtt(token, signal).await,
            TransportMode::Memory => self.run_mesh(token, signal).await,
        }
    }

    async fn run_mqtt<F>(self, token: Token, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let config = &self.container.config;
        let node = config.relay.node;
        let topic = config.relay.own_topic();

        let (transport, connection) = MqttTransport::connect(&config.transport.broker, node)
            .await
            .context("Failed to connect to MQTT broker")?;
        transport
            .subscribe(&topic)
            .await
            .context("Failed to subscribe to node topic")?;
        info!("[node-{}] Subscribed to {}", node, topic);

        let (inbox, _poller) = connection.spawn_inbox(topic, config.runtime.inbox_capacity);
        let service = self
            .container
            .relay_service(config.relay.clone(), Arc::new(transport.clone()));

        let mut handlers = JoinSet::new();
        handlers.spawn(
            RelayHandler::new(node, service.clone(), config.runtime.max_in_flight)
                .run(inbox, self.shutdown_rx.clone()),
        );

        let outcome = self
            .originate_and_wait(&[service], token, &mut handlers, signal, None)
            .await;

        self.stop(&mut handlers).await;
        transport.disconnect().await;
        outcome
    }

    async fn run_mesh<F>(self, token: Token, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let config = &self.container.config;
        let transport = BusTransport::new(Arc::new(InMemoryBus::new()));
        let publisher: Arc<dyn TokenPublisher> = Arc::new(transport.clone());

        let finished = Arc::new(Notify::new());
        let notifier: Arc<dyn Notifier> = Arc::new(CompletionNotifier {
            inner: self.container.notifier(),
            finished: Arc::clone(&finished),
        });

        let mut services = Vec::new();
        let mut handlers = JoinSet::new();
        for node in NodeIdentity::all() {
            let relay = RelayConfig::new(node)
                .with_variant(config.relay.variant)
                .with_topics(config.relay.topics.clone());
            let (inbox, _forwarder) =
                transport.spawn_inbox(&relay.own_topic(), config.runtime.inbox_capacity);

            let service = Arc::new(RelayService::new(
                relay,
                Arc::clone(&publisher),
                Arc::clone(&notifier),
            ));
            handlers.spawn(
                RelayHandler::new(node, service.clone(), config.runtime.max_in_flight)
                    .run(inbox, self.shutdown_rx.clone()),
            );
            services.push(service);
        }
        info!("Local mesh started with {} nodes", services.len());

        let outcome = self
            .originate_and_wait(&services, token, &mut handlers, signal, Some(finished))
            .await;

        self.stop(&mut handlers).await;
        outcome
    }

    async fn originate_and_wait<F>(
        &self,
        services: &[Arc<RelayService>],
        token: Token,
        handlers: &mut JoinSet<Result<(), RelayError>>,
        signal: F,
        finished: Option<Arc<Notify>>,
    ) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(signal);

        // A terminal origin notifies inline and may hang on the notifier.
        let originated = async {
            let mut terminated = false;
            for service in services {
                match service.originate(token.clone()).await {
                    Ok(HopReport::Terminated { .. }) => terminated = true,
                    Ok(_) => {}
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => warn!("[node-{}] Origination failed: {}", service.config().node, e),
                }
            }
            Ok(terminated)
        };

        let terminated = tokio::select! {
            _ = &mut signal => {
                info!("Shutdown requested during origination");
                return Ok(());
            }
            originated = originated => {
                originated.context("Traversal could not start")?
            }
        };

        let finished = async {
            match finished {
                Some(_) if terminated => {}
                Some(notify) => notify.notified().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = &mut signal => {
                info!("Shutdown requested");
                Ok(())
            }
            _ = finished => {
                info!("Traversal finished");
                Ok(())
            }
            Some(joined) = handlers.join_next() => match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e).context("Relay handler stopped"),
                Err(e) => Err(e).context("Relay handler panicked"),
            },
        }
    }

    /// Signal every handler and wait for it to drain or abort its deliveries.
    async fn stop(&self, handlers: &mut JoinSet<Result<(), RelayError>>) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        while let Some(joined) = handlers.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Relay handler exited with error: {}", e),
                Err(e) => error!("Relay handler panicked: {}", e),
            }
        }

        info!("Shutdown complete");
    }
}

/// Wakes the mesh runtime once any node finishes the traversal.
struct CompletionNotifier {
    inner: Arc<dyn Notifier>,
    finished: Arc<Notify>,
}

#[async_trait]
impl Notifier for CompletionNotifier {
    async fn notify(&self, node: NodeIdentity, token: &Token) -> Result<(), NotifyError> {
        let result = self.inner.notify(node, token).await;
        self.finished.notify_one();
        result
    }
}
