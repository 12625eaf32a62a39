//! Domain module for the relay engine
//!
//! Contains the token model, node identities, topic addressing, outcomes,
//! errors, and invariants. Nothing here performs I/O.

pub mod addressing;
pub mod errors;
pub mod invariants;
pub mod node;
pub mod outcome;
pub mod token;

pub use addressing::*;
pub use errors::*;
pub use node::*;
pub use outcome::*;
pub use token::*;
