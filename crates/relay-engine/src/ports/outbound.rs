//! Outbound Ports (Driven Ports / SPI)
//!
//! The transport, the barcode codec and the terminal notification channel
//! are infrastructure. The engine reaches them only through these traits.

use crate::domain::addressing::Topic;
use crate::domain::errors::{CodecError, NotifyError, TransportError};
use crate::domain::node::NodeIdentity;
use crate::domain::token::Token;
use async_trait::async_trait;

/// Publishing side of the pub/sub transport.
///
/// Implementations must allow `publish` to be called from inside a
/// delivery task for the same connection.
#[async_trait]
pub trait TokenPublisher: Send + Sync {
    /// Send `payload` as-is to `topic`. At-most-once, no retry.
    async fn publish(&self, topic: &Topic, payload: Vec<u8>) -> Result<(), TransportError>;
}

/// Out-of-band delivery of a finished traversal.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver the final, unmutated token from the terminal `node`.
    async fn notify(&self, node: NodeIdentity, token: &Token) -> Result<(), NotifyError>;
}

/// Conversion between a barcode image and a token string.
pub trait TokenCodec: Send + Sync {
    /// Read the token encoded in an image file's bytes.
    fn decode(&self, image: &[u8]) -> Result<String, CodecError>;

    /// Render a token as encoded image bytes.
    fn encode(&self, token: &str) -> Result<Vec<u8>, CodecError>;
}
