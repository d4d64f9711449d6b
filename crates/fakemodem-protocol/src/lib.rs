//! AT Command Line Protocol
//!
//! This crate provides the wire-level pieces of the modem emulator: turning a
//! raw byte stream into discrete command lines, recognizing the two SMS
//! directives that carry arguments, and producing reply bytes with the exact
//! terminators client software expects.
//!
//! # Protocol Overview
//!
//! The control channel is a simple line-based text interface:
//!
//! - **Commands** (host → modem): Text commands terminated with `\r`, `\n` or `\r\n`
//! - **Replies** (modem → host): Text blocks that carry their own terminators
//! - **Prompt**: `> ` with no terminator, sent when the modem waits for message text
//!
//! # Directives
//!
//! Almost every command is an exact-string lookup. Two are recognized by
//! pattern because they carry an argument:
//!
//! - `AT+CMGS=<address>` - compose a message to `<address>`
//! - `AT+CMGR=<slot>` - read the message stored in `<slot>`
//!
//! # Example
//!
//! ```rust
//! use fakemodem_protocol::{Directive, Frame, LineFramer};
//!
//! let mut framer = LineFramer::new();
//! let frames = framer.push(b"AT+CMGS=\"12345\"\r");
//! assert_eq!(frames, vec![Frame::Line("AT+CMGS=\"12345\"".to_string())]);
//!
//! let directive = Directive::parse("AT+CMGS=\"12345\"");
//! assert_eq!(directive, Some(Directive::SendMessage { address: "12345".to_string() }));
//! ```

mod codec;
mod commands;
mod error;
mod responses;

pub use codec::*;
pub use commands::*;
pub use error::*;
pub use responses::*;
