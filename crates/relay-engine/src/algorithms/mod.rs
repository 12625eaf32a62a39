//! Relay algorithms
//!
//! Pure functions over tokens. Identical inputs always give identical
//! outputs, so concurrent deliveries never need to share state.

pub mod counter;
pub mod routing;

pub use counter::advance_counter;
pub use routing::{evaluate, is_origin, resolve_next_hop};
