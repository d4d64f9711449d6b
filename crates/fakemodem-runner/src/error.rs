//! Error types for the runner.

use std::io;

use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// I/O error reading a configuration file.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file being read.
        path: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// YAML parse error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parse error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension is neither YAML nor JSON.
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// The configuration parsed but is not usable.
    #[error(transparent)]
    Config(#[from] fakemodem_core::ConfigError),
}

/// Errors on the byte channel. Any of them ends the session.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        /// Device path or address.
        path: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Reading from the transport failed.
    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    /// Writing a reply failed.
    #[error("write failed: {0}")]
    Write(#[source] io::Error),
}
