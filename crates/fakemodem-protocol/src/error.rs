//! Error types for the AT protocol.

use thiserror::Error;

/// Errors that can occur when working with the AT protocol.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Failed to parse a reply.
    #[error("failed to parse reply: {0}")]
    ParseError(String),

    /// A directive was recognized but its argument could not be extracted.
    #[error("invalid directive argument: {0}")]
    InvalidArgument(String),
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
