//! # Adapter Implementations
//!
//! Concrete implementations of the relay engine's outbound ports:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  OUTER LAYER (Adapters)                      │
//! │  MqttTransport, BusTransport, BarcodeCodec, SendGridNotifier │
//! └──────────────────────────────────────────────────────────────┘
//!                         ↑ implements ↑
//! ┌──────────────────────────────────────────────────────────────┐
//! │  TokenPublisher, TokenCodec, Notifier (relay-engine ports)   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod barcode;
pub mod event_bus;
pub mod log_notifier;
pub mod mqtt;
pub mod sendgrid;

pub use barcode::BarcodeCodec;
pub use event_bus::BusTransport;
pub use log_notifier::LogNotifier;
pub use mqtt::{MqttConnection, MqttTransport};
pub use sendgrid::SendGridNotifier;
