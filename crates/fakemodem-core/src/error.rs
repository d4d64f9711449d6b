//! Error types for the emulator engine.

use thiserror::Error;

/// Errors raised while turning configuration into a [`crate::ModemProfile`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A setting has a value the engine cannot use.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// The offending setting.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}
