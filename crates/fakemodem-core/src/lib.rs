//! Modem emulator engine.
//!
//! This crate holds everything that has state: the command table, the
//! message store, the compose sub-protocol and the dispatcher that ties them
//! together. One [`ModemSession`] exists per connection; the [`ModemProfile`]
//! (command table plus settings) is immutable and shared between sessions.
//!
//! ```text
//! bytes ─> LineFramer ─> Dispatcher ─┬─> MessageStore (compose / read)
//!                                    └─> CommandTable (everything else)
//!                                             │
//!                             Reply bytes <───┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use fakemodem_core::{ModemConfig, ModemSession};
//!
//! let profile = Arc::new(ModemConfig::default().build_profile().unwrap());
//! let mut session = ModemSession::new(1, profile);
//!
//! let replies = session.feed_all(b"AT\r\n");
//! assert_eq!(replies[0].as_bytes(), b"OK\r\n");
//! ```

mod config;
mod defaults;
mod dispatcher;
mod error;
mod modem;
mod session;
mod store;
mod table;

pub use config::*;
pub use defaults::REFERENCE_COMMANDS;
pub use dispatcher::*;
pub use error::*;
pub use modem::*;
pub use session::*;
pub use store::*;
pub use table::*;
