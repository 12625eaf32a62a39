//! # Node Runtime Library
//!
//! This library exposes the internal modules of the relay node for testing.
//! The main entry point is the `relay-node` binary.
//!
//! ## Architectural Patterns
//!
//! - **Hexagonal Architecture**: relay-engine ports, adapters implemented here
//! - **EDA (Event-Driven Architecture)**: nodes only talk through topics
//! - **Plug-and-Play**: transport and notifier selected by configuration

#![allow(clippy::type_complexity)]

pub mod adapters;
pub mod container;
pub mod handlers;
pub mod runtime;

pub use container::{ConfigError, NodeConfig, ServiceContainer};
pub use runtime::NodeRuntime;
