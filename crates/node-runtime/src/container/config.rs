//! # Node Configuration
//!
//! Unified configuration for the relay engine and its adapters.
//!
//! ## Requirements
//!
//! - Built once at startup, immutable afterwards
//! - Node identity restricted to 1..=9 (one route digit per hop)
//! - SendGrid credentials MUST be present when the email notifier is selected

use std::path::PathBuf;

use relay_engine::{NodeIdentity, ProtocolVariant, RelayConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default MQTT port when the endpoint omits one.
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Default SendGrid v3 send endpoint.
pub const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

/// Default SendGrid request timeout in seconds.
pub const SENDGRID_TIMEOUT_SECS: u64 = 10;

/// Default SendGrid connect timeout in seconds.
pub const SENDGRID_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Complete node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Engine configuration (identity, variant, topics).
    pub relay: RelayConfig,
    /// Barcode image holding the token.
    pub image_path: PathBuf,
    /// Transport configuration.
    pub transport: TransportConfig,
    /// Terminal notification channel.
    pub notifier: NotifierConfig,
    /// Delivery handling limits.
    pub runtime: RuntimeConfig,
}

impl NodeConfig {
    /// Configuration with defaults for everything but identity and image.
    pub fn new(node: NodeIdentity, image_path: impl Into<PathBuf>) -> Self {
        let relay = RelayConfig::new(node);
        let notifier = NotifierConfig::default_for(relay.variant);
        Self {
            relay,
            image_path: image_path.into(),
            transport: TransportConfig::default(),
            notifier,
            runtime: RuntimeConfig::default(),
        }
    }

    /// Validate the parts that cannot be checked by construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runtime.max_in_flight == 0 {
            return Err(ConfigError::InvalidLimit("max_in_flight"));
        }
        if self.runtime.inbox_capacity == 0 {
            return Err(ConfigError::InvalidLimit("inbox_capacity"));
        }
        if let NotifierConfig::SendGrid(sendgrid) = &self.notifier {
            sendgrid.validate()?;
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid broker endpoint {0:?}: expected host[:port]")]
    InvalidEndpoint(String),

    #[error("Missing {0}: set it in the environment or on the command line")]
    MissingSecret(&'static str),

    #[error("{0} must be greater than zero")]
    InvalidLimit(&'static str),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// How nodes reach each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// One node per process over an MQTT broker.
    #[default]
    Mqtt,
    /// Nodes 1..=9 in this process over the in-memory bus.
    Memory,
}

/// Transport configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportConfig {
    pub mode: TransportMode,
    pub broker: BrokerConfig,
}

/// MQTT broker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker host name.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Client id prefix; the node identity is appended.
    pub client_prefix: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u64,
    /// Outgoing request queue size.
    pub request_capacity: usize,
}

impl BrokerConfig {
    /// Parse `host[:port]`, accepting an optional `tcp://` or `mqtt://` scheme.
    pub fn parse_endpoint(endpoint: &str) -> Result<(String, u16), ConfigError> {
        let invalid = || ConfigError::InvalidEndpoint(endpoint.to_string());

        let address = endpoint
            .strip_prefix("tcp://")
            .or_else(|| endpoint.strip_prefix("mqtt://"))
            .unwrap_or(endpoint);

        let (host, port) = match address.rsplit_once(':') {
            Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid())?),
            None => (address, DEFAULT_MQTT_PORT),
        };

        if host.is_empty() || host.contains('/') {
            return Err(invalid());
        }
        Ok((host.to_string(), port))
    }

    /// Broker settings from an endpoint string and a client id prefix.
    pub fn from_endpoint(endpoint: &str, client_prefix: &str) -> Result<Self, ConfigError> {
        let (host, port) = Self::parse_endpoint(endpoint)?;
        Ok(Self {
            host,
            port,
            client_prefix: client_prefix.to_string(),
            ..Self::default()
        })
    }

    /// Client id for a node: `<prefix>-<node>`.
    pub fn client_id(&self, node: NodeIdentity) -> String {
        format!("{}-{}", self.client_prefix, node)
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "test.mosquitto.org".to_string(),
            port: DEFAULT_MQTT_PORT,
            client_prefix: "gnode".to_string(),
            keep_alive_secs: 30,
            request_capacity: 64,
        }
    }
}

/// Terminal notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum NotifierConfig {
    /// Log the finished token only.
    Log,
    /// Email the rendered barcode through SendGrid.
    SendGrid(SendGridConfig),
}

impl NotifierConfig {
    /// Counter deployments email the result, plain ones finish silently.
    pub fn default_for(variant: ProtocolVariant) -> Self {
        match variant {
            ProtocolVariant::Counter => Self::SendGrid(SendGridConfig::default()),
            ProtocolVariant::Plain => Self::Log,
        }
    }
}

/// SendGrid settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendGridConfig {
    /// API key (`SENDGRID_API_KEY`).
    pub api_key: String,
    /// Sender address (`SENDGRID_EMAIL`).
    pub from_email: String,
    /// Recipient address (`SENDGRID_RECEIVER`).
    pub to_email: String,
    /// Recipient display name.
    pub to_name: String,
    /// Send endpoint.
    pub endpoint: String,
    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    SENDGRID_TIMEOUT_SECS
}

fn default_connect_timeout_secs() -> u64 {
    SENDGRID_CONNECT_TIMEOUT_SECS
}

impl SendGridConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingSecret("SENDGRID_API_KEY"));
        }
        if self.from_email.is_empty() {
            return Err(ConfigError::MissingSecret("SENDGRID_EMAIL"));
        }
        if self.to_email.is_empty() {
            return Err(ConfigError::MissingSecret("SENDGRID_RECEIVER"));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidLimit("timeout_secs"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidLimit("connect_timeout_secs"));
        }
        Ok(())
    }
}

impl Default for SendGridConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            from_email: String::new(),
            to_email: String::new(),
            to_name: "Example User".to_string(),
            endpoint: SENDGRID_ENDPOINT.to_string(),
            timeout_secs: SENDGRID_TIMEOUT_SECS,
            connect_timeout_secs: SENDGRID_CONNECT_TIMEOUT_SECS,
        }
    }
}

// Keeps the API key out of logs.
impl std::fmt::Debug for SendGridConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridConfig")
            .field("api_key", &"<redacted>")
            .field("from_email", &self.from_email)
            .field("to_email", &self.to_email)
            .field("to_name", &self.to_name)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Delivery handling limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Deliveries evaluated concurrently per node.
    pub max_in_flight: usize,
    /// Payloads buffered between transport and handler.
    pub inbox_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 16,
            inbox_capacity: 64,
        }
    }
}
