//! # Event Handlers
//!
//! Inbox consumers feeding transport deliveries into the relay service.

pub mod relay;

pub use relay::RelayHandler;
