//! Ports module for the relay engine
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::RelayApi;
pub use outbound::{Notifier, TokenCodec, TokenPublisher};
