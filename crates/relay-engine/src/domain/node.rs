//! Node identities
//!
//! A route spends exactly one ASCII character per hop, so identities are
//! limited to the digits 1 through 9. `0` may appear in a route but never
//! names a node.

use super::errors::RelayError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a single relay participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct NodeIdentity(u8);

impl NodeIdentity {
    /// Smallest valid identity.
    pub const MIN: u8 = 1;
    /// Largest identity expressible as one route digit.
    pub const MAX: u8 = 9;

    /// Validate a configured identity.
    pub fn new(value: u32) -> Result<Self, RelayError> {
        match u8::try_from(value) {
            Ok(v) if (Self::MIN..=Self::MAX).contains(&v) => Ok(Self(v)),
            _ => Err(RelayError::InvalidNodeIdentity(value)),
        }
    }

    /// Decode a route character. Returns `None` for `0` and non-digits.
    #[must_use]
    pub fn from_digit(byte: u8) -> Option<Self> {
        match byte {
            b'1'..=b'9' => Some(Self(byte - b'0')),
            _ => None,
        }
    }

    /// The ASCII digit this node occupies in a route.
    #[must_use]
    pub fn digit(self) -> u8 {
        b'0' + self.0
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Every valid identity, in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (Self::MIN..=Self::MAX).map(Self)
    }
}

impl TryFrom<u32> for NodeIdentity {
    type Error = RelayError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NodeIdentity> for u32 {
    fn from(node: NodeIdentity) -> Self {
        u32::from(node.0)
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
