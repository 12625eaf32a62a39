//! Domain invariants for the relay protocol
//!
//! Checked with `debug_assert!` on every forward and exercised directly by
//! the test suites.

use super::outcome::RelayOutcome;
use super::token::Token;

/// INVARIANT-1: Route Preserved
/// A hop never rewrites the route digits.
pub fn invariant_route_preserved(received: &Token, forwarded: &Token) -> bool {
    received.route() == forwarded.route()
}

/// INVARIANT-2: Single Increment
/// The counter grows by exactly one per hop; tokens without a counter pass
/// through untouched.
pub fn invariant_single_increment(received: &Token, forwarded: &Token) -> bool {
    match (received.counter(), forwarded.counter()) {
        (Some(before), Some(after)) => before.checked_add(1) == Some(after),
        (None, None) => received == forwarded,
        _ => false,
    }
}

/// INVARIANT-3: Terminal Token Unmutated
/// The notifier receives the token exactly as it arrived.
pub fn invariant_terminal_unmutated(received: &Token, outcome: &RelayOutcome) -> bool {
    match outcome {
        RelayOutcome::Terminate { token } => token == received,
        RelayOutcome::Forward { .. } => true,
    }
}

/// All forward-path invariants at once.
pub fn check_forward(received: &Token, forwarded: &Token) -> bool {
    invariant_route_preserved(received, forwarded)
        && invariant_single_increment(received, forwarded)
}
