//! Token model
//!
//! ## Wire Format
//!
//! ```text
//! ┌──────────────────┬──────────────┐
//! │ route (1+ digit) │ counter (6)  │   counter variant
//! └──────────────────┴──────────────┘
//!   "1205"             "000001"
//! ```
//!
//! The plain variant carries the route only. The string is sent as the raw
//! transport payload with no framing.

use super::errors::RelayError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of the zero-padded counter suffix.
pub const COUNTER_WIDTH: usize = 6;

/// Largest value the counter suffix can hold.
pub const COUNTER_MAX: u32 = 999_999;

/// Token layout used by a deployment. Never mixed within one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVariant {
    /// Route followed by a 6-digit counter incremented on every hop.
    #[default]
    Counter,
    /// Route only; tokens are forwarded unchanged.
    Plain,
}

impl fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counter => f.write_str("counter"),
            Self::Plain => f.write_str("plain"),
        }
    }
}

/// A validated relay token.
///
/// Each hop builds a new value; the route never changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    route: String,
    counter: Option<u32>,
}

impl Token {
    /// Parse and validate a token string under the given variant.
    pub fn parse(raw: &str, variant: ProtocolVariant) -> Result<Self, RelayError> {
        let bytes = raw.as_bytes();

        let (route, counter) = match variant {
            ProtocolVariant::Plain => (bytes, None),
            ProtocolVariant::Counter => {
                if bytes.len() < COUNTER_WIDTH {
                    return Err(RelayError::malformed(
                        raw,
                        format!("shorter than the {COUNTER_WIDTH}-digit counter"),
                    ));
                }
                let (route, suffix) = bytes.split_at(bytes.len() - COUNTER_WIDTH);
                (route, Some(parse_counter(raw, suffix)?))
            }
        };

        if let Some(bad) = route.iter().find(|b| !b.is_ascii_digit()) {
            return Err(RelayError::malformed(
                raw,
                format!("route contains non-digit {:?}", char::from(*bad)),
            ));
        }

        // Only ASCII digits remain, so every byte is a char boundary.
        let route = String::from_utf8_lossy(route).into_owned();
        Ok(Self { route, counter })
    }

    /// Parse a raw transport payload.
    pub fn from_payload(payload: &[u8], variant: ProtocolVariant) -> Result<Self, RelayError> {
        let raw = std::str::from_utf8(payload).map_err(|_| {
            RelayError::malformed(
                String::from_utf8_lossy(payload).into_owned(),
                "payload is not valid UTF-8",
            )
        })?;
        Self::parse(raw, variant)
    }

    /// Route digits, counter excluded.
    #[must_use]
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Counter value, if the token carries one.
    #[must_use]
    pub fn counter(&self) -> Option<u32> {
        self.counter
    }

    #[must_use]
    pub fn variant(&self) -> ProtocolVariant {
        match self.counter {
            Some(_) => ProtocolVariant::Counter,
            None => ProtocolVariant::Plain,
        }
    }

    /// Same route, new counter value. Callers guarantee `counter <= COUNTER_MAX`.
    pub(crate) fn with_counter(&self, counter: u32) -> Self {
        debug_assert!(counter <= COUNTER_MAX);
        Self {
            route: self.route.clone(),
            counter: Some(counter),
        }
    }

    /// Bytes sent on the wire.
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.route)?;
        if let Some(counter) = self.counter {
            write!(f, "{counter:0width$}", width = COUNTER_WIDTH)?;
        }
        Ok(())
    }
}

fn parse_counter(raw: &str, suffix: &[u8]) -> Result<u32, RelayError> {
    if !suffix.iter().all(u8::is_ascii_digit) {
        return Err(RelayError::malformed(
            raw,
            "counter suffix is not a non-negative integer",
        ));
    }
    Ok(suffix
        .iter()
        .fold(0u32, |acc, digit| acc * 10 + u32::from(digit - b'0')))
}
