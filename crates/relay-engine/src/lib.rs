//! # Relay Engine
//!
//! Token routing protocol and relay state machine.
//!
//! A token is a string of route digits, optionally followed by a fixed-width
//! hop counter. Each node looks up the first occurrence of its own digit in
//! the route; the digit right after it names the next hop. When there is no
//! such digit the node is terminal and the token is handed to a notifier.
//!
//! ## Architecture
//!
//! - **Domain** (`domain/`): `Token`, `NodeIdentity`, `TopicTemplate`, `RelayOutcome`, errors
//! - **Algorithms** (`algorithms/`): pure hop resolution and counter mutation
//! - **Ports** (`ports/`): Inbound (`RelayApi`) and Outbound (`TokenPublisher`,
//!   `Notifier`, `TokenCodec`)
//! - **Application** (`application/`): `RelayService` wiring the algorithms to the ports
//!
//! ## Traversal
//!
//! ```text
//!     node 1                      node 2
//! "1205000001" ──GRUPO2──→ "1205000002" ──→ Notifier
//!   Forward(2)               Terminate ('0' names no node)
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use algorithms::{advance_counter, evaluate, is_origin, resolve_next_hop};
pub use application::service::RelayService;
pub use config::RelayConfig;
pub use domain::addressing::{Topic, TopicTemplate, DEFAULT_TOPIC_TEMPLATE};
pub use domain::errors::{CodecError, NotifyError, RelayError, TransportError};
pub use domain::node::NodeIdentity;
pub use domain::outcome::{HopReport, RelayOutcome};
pub use domain::token::{ProtocolVariant, Token, COUNTER_MAX, COUNTER_WIDTH};
pub use ports::inbound::RelayApi;
pub use ports::outbound::{Notifier, TokenCodec, TokenPublisher};
