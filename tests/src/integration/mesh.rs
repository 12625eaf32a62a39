//! # Mesh Fixture
//!
//! Nodes wired exactly as the runtime wires them: one [`RelayService`] and
//! one [`RelayHandler`] per node, all sharing a [`BusTransport`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::timeout;

use node_runtime::adapters::BusTransport;
use node_runtime::handlers::RelayHandler;
use relay_engine::{
    HopReport, NodeIdentity, Notifier, NotifyError, ProtocolVariant, RelayApi, RelayConfig,
    RelayError, RelayService, Token, TokenPublisher, TopicTemplate,
};
use shared_bus::InMemoryBus;

/// Terminal notification observed by the fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub node: u8,
    pub token: String,
}

/// Notifier forwarding every terminal token to the test.
struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Delivery>,
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, node: NodeIdentity, token: &Token) -> Result<(), NotifyError> {
        let _ = self.tx.send(Delivery {
            node: node.get(),
            token: token.to_string(),
        });
        Ok(())
    }
}

/// Nodes 1..=9 on one in-memory bus.
pub struct Mesh {
    pub transport: BusTransport,
    pub topics: TopicTemplate,
    pub variant: ProtocolVariant,
    services: Vec<Arc<RelayService>>,
    handlers: JoinSet<(u8, Result<(), RelayError>)>,
    deliveries: mpsc::UnboundedReceiver<Delivery>,
    shutdown: watch::Sender<bool>,
}

impl Mesh {
    pub fn start(variant: ProtocolVariant) -> Self {
        Self::start_with(variant, TopicTemplate::default())
    }

    pub fn start_with(variant: ProtocolVariant, topics: TopicTemplate) -> Self {
        let transport = BusTransport::new(Arc::new(InMemoryBus::new()));
        let publisher: Arc<dyn TokenPublisher> = Arc::new(transport.clone());
        let (tx, deliveries) = mpsc::unbounded_channel();
        let notifier: Arc<dyn Notifier> = Arc::new(ChannelNotifier { tx });
        let (shutdown, shutdown_rx) = watch::channel(false);

        let mut services = Vec::new();
        let mut handlers = JoinSet::new();
        for node in NodeIdentity::all() {
            let relay = RelayConfig::new(node)
                .with_variant(variant)
                .with_topics(topics.clone());
            let (inbox, _forwarder) = transport.spawn_inbox(&relay.own_topic(), 64);
            let service = Arc::new(RelayService::new(
                relay,
                Arc::clone(&publisher),
                Arc::clone(&notifier),
            ));

            let handler = RelayHandler::new(node, service.clone(), 4);
            let rx = shutdown_rx.clone();
            handlers.spawn(async move { (node.get(), handler.run(inbox, rx).await) });
            services.push(service);
        }

        Self {
            transport,
            topics,
            variant,
            services,
            handlers,
            deliveries,
            shutdown,
        }
    }

    pub fn service(&self, node: u8) -> &Arc<RelayService> {
        &self.services[usize::from(node) - 1]
    }

    /// Every node decodes the same token at startup; only the origin acts.
    pub async fn originate(&self, raw: &str) -> Vec<HopReport> {
        let token = Token::parse(raw, self.variant).unwrap();
        let mut reports = Vec::new();
        for service in &self.services {
            reports.push(service.originate(token.clone()).await.unwrap());
        }
        reports
    }

    /// Publish raw bytes straight onto a node topic.
    pub async fn inject(&self, node: u8, payload: &[u8]) {
        let topic = self.topics.address_for(NodeIdentity::new(u32::from(node)).unwrap());
        self.transport.publish(&topic, payload.to_vec()).await.unwrap();
    }

    pub async fn next_delivery(&mut self) -> Delivery {
        timeout(Duration::from_secs(2), self.deliveries.recv())
            .await
            .expect("timeout waiting for terminal notification")
            .expect("notifier dropped")
    }

    /// No further notification arrives within a short window.
    pub async fn assert_quiet(&mut self) {
        let extra = timeout(Duration::from_millis(100), self.deliveries.recv()).await;
        assert!(extra.is_err(), "unexpected notification: {:?}", extra);
    }

    /// First handler to stop on its own, with its node id.
    pub async fn next_handler_exit(&mut self) -> (u8, Result<(), RelayError>) {
        timeout(Duration::from_secs(5), self.handlers.join_next())
            .await
            .expect("timeout waiting for handler exit")
            .expect("no handlers running")
            .expect("handler panicked")
    }

    pub async fn shutdown(mut self) -> Vec<(u8, Result<(), RelayError>)> {
        let _ = self.shutdown.send(true);
        let mut exits = Vec::new();
        while let Some(joined) = self.handlers.join_next().await {
            exits.push(joined.expect("handler panicked"));
        }
        exits
    }
}

/// Evaluate without the mesh, for cross-checking.
pub fn evaluate_at(node: u8, raw: &str, variant: ProtocolVariant) -> relay_engine::RelayOutcome {
    let token = Token::parse(raw, variant).unwrap();
    relay_engine::evaluate(&token, NodeIdentity::new(u32::from(node)).unwrap()).unwrap()
}
