//! # Service Container
//!
//! Node configuration and the container wiring adapters into relay
//! services.

pub mod config;
pub mod services;

pub use config::{ConfigError, NodeConfig};
pub use services::ServiceContainer;
