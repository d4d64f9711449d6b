//! Transports and runner for the modem emulator.
//!
//! The engine in `fakemodem-core` only turns bytes into replies. This crate
//! connects it to real byte streams:
//!
//! - [`transport::run_session`] drives one session over any blocking
//!   `Read + Write` transport (stdio, a character device, a test double)
//! - [`tcp_server::TcpModemServer`] accepts TCP connections and gives each
//!   its own session, sharing one [`fakemodem_core::ModemProfile`]
//! - [`config::load_config`] reads a YAML or JSON [`fakemodem_core::ModemConfig`]
//! - [`metrics_export::InMemoryRecorder`] collects metrics for a JSON dump

pub mod config;
pub mod error;
pub mod metrics_export;
pub mod tcp_server;
pub mod transport;

pub use error::{RunnerError, TransportError};
