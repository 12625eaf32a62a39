//! Application layer for the relay engine.

pub mod service;

pub use service::RelayService;
