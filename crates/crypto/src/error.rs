//! Error types for commitment operations.

use thiserror::Error;

/// Errors that can occur while encoding or decoding committed values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid bid encoding: {0}")]
    InvalidEncoding(String),
}
