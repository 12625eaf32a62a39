//! # Token Relay Test Suite
//!
//! Unified test crate for behavior that spans several nodes.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── mesh.rs        # In-process mesh fixture (bus + handlers)
//!     ├── traversal.rs   # End-to-end traversals and failure modes
//!     └── addressing.rs  # Publisher/subscriber topic agreement
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p relay-tests
//! cargo test -p relay-tests integration::traversal::
//! ```

pub mod integration;
