//! Hop resolution
//!
//! ## Algorithm
//!
//! 1. Find the FIRST occurrence of the node's digit in the route
//! 2. The digit right after it is the next hop
//! 3. No occurrence, last position, or a following `0` ends the traversal
//!
//! Later occurrences of the same digit are never revisited, so a route
//! such as `"1213"` sends node 1's traffic to node 2 every time.

use super::counter::advance_counter;
use crate::domain::errors::RelayError;
use crate::domain::node::NodeIdentity;
use crate::domain::outcome::RelayOutcome;
use crate::domain::token::Token;

/// Whether the traversal starts at `node`.
pub fn is_origin(token: &Token, node: NodeIdentity) -> bool {
    token.route().starts_with(&node.to_string())
}

/// Next node after `node` on the token's route, or `None` when `node` is
/// terminal.
pub fn resolve_next_hop(token: &Token, node: NodeIdentity) -> Option<NodeIdentity> {
    let route = token.route().as_bytes();
    let position = route.iter().position(|&digit| digit == node.digit())?;
    route
        .get(position + 1)
        .copied()
        .and_then(NodeIdentity::from_digit)
}

/// Evaluate a token at `node`.
///
/// Forwarded tokens carry the advanced counter; a terminal token is
/// returned exactly as received.
pub fn evaluate(token: &Token, node: NodeIdentity) -> Result<RelayOutcome, RelayError> {
    match resolve_next_hop(token, node) {
        Some(next) => Ok(RelayOutcome::Forward {
            next,
            token: advance_counter(token)?,
        }),
        None => Ok(RelayOutcome::Terminate {
            token: token.clone(),
        }),
    }
}
