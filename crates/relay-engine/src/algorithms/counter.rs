//! Counter mutation applied before each forward.

use crate::domain::errors::RelayError;
use crate::domain::token::{Token, COUNTER_MAX, COUNTER_WIDTH};

/// Increment the counter suffix by one.
///
/// Tokens without a counter are returned unchanged. A counter already at
/// [`COUNTER_MAX`] fails instead of wrapping or widening.
pub fn advance_counter(token: &Token) -> Result<Token, RelayError> {
    let Some(value) = token.counter() else {
        return Ok(token.clone());
    };

    let next = value
        .checked_add(1)
        .filter(|next| *next <= COUNTER_MAX)
        .ok_or(RelayError::CounterOverflow {
            value,
            width: COUNTER_WIDTH,
        })?;

    Ok(token.with_counter(next))
}
