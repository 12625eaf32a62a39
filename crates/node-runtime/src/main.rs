//! # Relay Node
//!
//! Runs one node of the token relay.
//!
//! ## Startup Sequence
//!
//! 1. Parse arguments (SendGrid secrets come from the environment)
//! 2. Validate configuration and build adapters
//! 3. Decode the barcode image into the token
//! 4. Connect, subscribe, originate when this node is the route head
//! 5. Relay until Ctrl+C or a fatal error
//!
//! ```text
//! relay-node --node 1 --image token.jpg                   # one node over MQTT
//! relay-node --node 1 --image token.jpg --transport memory # nodes 1..=9 in process
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use node_runtime::container::config::{
    BrokerConfig, NotifierConfig, SendGridConfig, TransportMode,
};
use node_runtime::{NodeConfig, NodeRuntime, ServiceContainer};
use relay_engine::{NodeIdentity, ProtocolVariant, TopicTemplate, DEFAULT_TOPIC_TEMPLATE};

/// Relay node: forwards a barcode token along the route it encodes.
#[derive(Parser, Debug)]
#[command(name = "relay-node")]
#[command(about = "Relay a barcode token across MQTT nodes")]
struct Args {
    /// Node identity (1-9)
    #[arg(short, long, default_value_t = 1)]
    node: u32,

    /// Barcode image holding the token
    #[arg(short, long)]
    image: PathBuf,

    /// MQTT broker as host[:port]
    #[arg(short, long, default_value = "test.mosquitto.org:1883")]
    broker: String,

    /// MQTT client id prefix; the node identity is appended
    #[arg(short, long, default_value = "gnode")]
    client: String,

    /// Token format
    #[arg(long, value_enum, default_value_t = VariantArg::Counter)]
    variant: VariantArg,

    /// Topic template; `{node}` is replaced with the node identity
    #[arg(long, default_value = DEFAULT_TOPIC_TEMPLATE)]
    topic_template: String,

    /// Terminal notification (defaults to email for counter, log for plain)
    #[arg(long, value_enum)]
    notifier: Option<NotifierArg>,

    /// Transport between nodes
    #[arg(long, value_enum, default_value_t = TransportArg::Mqtt)]
    transport: TransportArg,

    /// Deliveries evaluated concurrently per node
    #[arg(long, default_value_t = 16)]
    max_in_flight: usize,

    /// SendGrid API key
    #[arg(long, env = "SENDGRID_API_KEY", hide_env_values = true)]
    sendgrid_api_key: Option<String>,

    /// Sender address for the final email
    #[arg(long, env = "SENDGRID_EMAIL")]
    sendgrid_email: Option<String>,

    /// Recipient address for the final email
    #[arg(long, env = "SENDGRID_RECEIVER")]
    sendgrid_receiver: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum VariantArg {
    Counter,
    Plain,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum NotifierArg {
    Log,
    Sendgrid,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum TransportArg {
    Mqtt,
    Memory,
}

impl Args {
    /// Build the node configuration.
    fn into_config(self) -> Result<NodeConfig> {
        let node = NodeIdentity::new(self.node).context("Invalid --node")?;
        let variant = match self.variant {
            VariantArg::Counter => ProtocolVariant::Counter,
            VariantArg::Plain => ProtocolVariant::Plain,
        };
        let topics =
            TopicTemplate::parse(&self.topic_template).context("Invalid --topic-template")?;

        let mut config = NodeConfig::new(node, self.image);
        config.relay = config.relay.with_variant(variant).with_topics(topics);
        config.transport.mode = match self.transport {
            TransportArg::Mqtt => TransportMode::Mqtt,
            TransportArg::Memory => TransportMode::Memory,
        };
        config.transport.broker =
            BrokerConfig::from_endpoint(&self.broker, &self.client).context("Invalid --broker")?;
        config.runtime.max_in_flight = self.max_in_flight;

        let notifier = self.notifier.unwrap_or(match variant {
            ProtocolVariant::Counter => NotifierArg::Sendgrid,
            ProtocolVariant::Plain => NotifierArg::Log,
        });
        config.notifier = match notifier {
            NotifierArg::Log => NotifierConfig::Log,
            NotifierArg::Sendgrid => NotifierConfig::SendGrid(SendGridConfig {
                api_key: self.sendgrid_api_key.unwrap_or_default(),
                from_email: self.sendgrid_email.unwrap_or_default(),
                to_email: self.sendgrid_receiver.unwrap_or_default(),
                ..SendGridConfig::default()
            }),
        };

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Args::parse().into_config()?;
    info!(
        node = %config.relay.node,
        variant = %config.relay.variant,
        transport = ?config.transport.mode,
        "Starting relay node"
    );

    let container = ServiceContainer::new(config).context("Invalid configuration")?;
    let runtime = NodeRuntime::new(container);

    info!("Node is running. Press Ctrl+C to stop.");
    runtime
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
}
