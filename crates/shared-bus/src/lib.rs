//! # Shared Bus - In-Process Pub/Sub
//!
//! Topic-addressed message bus with broker semantics close enough to MQTT
//! QoS 0 to run several relay nodes inside one process.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │   Node 1     │                    │   Node 2     │
//! │              │  publish(GRUPO2)   │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Shared Bus  │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe(GRUPO2)
//! ```
//!
//! ## Delivery
//!
//! - At-most-once: a subscriber that lags loses the overwritten messages
//! - Messages published before a subscription exists are not delivered
//! - Payloads are opaque bytes

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{BusMessage, TopicFilter};
pub use publisher::{InMemoryBus, MessagePublisher};
pub use subscriber::MessageStream;

/// Maximum messages to buffer per subscriber before old ones are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

