//! Reply formatting for the AT protocol.
//!
//! Replies are written to the transport exactly as formatted here or as
//! stored in the command table. No terminator is ever appended on the way
//! out: table templates already carry the device's own (inconsistent) line
//! endings, and the compose prompt deliberately has none.

use std::borrow::Cow;

use crate::error::{ProtocolError, ProtocolResult};

/// Prompt sent after a compose directive, waiting for the message text.
pub const COMPOSE_PROMPT: &str = "> ";

/// Error reply used when extended errors are off.
pub const TERSE_ERROR: &str = "ERROR\r\n";

/// Error reply used when extended errors are on.
pub const VERBOSE_ERROR: &str = "+CME ERROR: invalid command\r\n";

/// Reply to a read of an empty slot.
pub const NO_MESSAGE: &str = "+CMGR: 0\r\nOK\r\n";

/// Status reported for every stored message.
pub const MESSAGE_STATUS: &str = "REC READ";

/// Timestamp reported for every stored message.
pub const MESSAGE_TIMESTAMP: &str = "25/07/16,12:00:00";

/// A reply to one command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A terminated text block, written byte-for-byte.
    Block(Cow<'static, str>),
    /// The compose prompt, written without a terminator.
    Prompt,
}

impl Reply {
    /// A block reply taken from a table template.
    pub fn template(text: impl Into<String>) -> Reply {
        Reply::Block(Cow::Owned(text.into()))
    }

    /// The unknown-command error in the requested format.
    pub fn error(verbose: bool) -> Reply {
        if verbose {
            Reply::Block(Cow::Borrowed(VERBOSE_ERROR))
        } else {
            Reply::Block(Cow::Borrowed(TERSE_ERROR))
        }
    }

    /// Confirmation that composed text was stored in `slot`.
    pub fn message_stored(slot: u32) -> Reply {
        Reply::Block(Cow::Owned(format!("\r\n+CMGS: {}\r\nOK\r\n", slot)))
    }

    /// A stored message returned by a read directive.
    pub fn message(address: &str, text: &str) -> Reply {
        Reply::Block(Cow::Owned(format!(
            "+CMGR: \"{}\",\"{}\",,\"{}\"\r\n{}\r\nOK\r\n",
            MESSAGE_STATUS, address, MESSAGE_TIMESTAMP, text
        )))
    }

    /// The reply to reading an empty slot.
    pub fn no_message() -> Reply {
        Reply::Block(Cow::Borrowed(NO_MESSAGE))
    }

    /// The exact bytes to write to the transport.
    pub fn as_bytes(&self) -> &[u8] {
        self.as_str().as_bytes()
    }

    /// The reply text.
    pub fn as_str(&self) -> &str {
        match self {
            Reply::Block(text) => text.as_ref(),
            Reply::Prompt => COMPOSE_PROMPT,
        }
    }

    /// Check if this is the compose prompt.
    pub fn is_prompt(&self) -> bool {
        matches!(self, Reply::Prompt)
    }

    /// Check if this is one of the unknown-command error replies.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Block(text) if text == TERSE_ERROR || text == VERBOSE_ERROR)
    }
}

/// A parsed reply to `AT+CMGR=<slot>`, as seen by a client.
///
/// The emulator never parses its own replies. This is for client code driving
/// it, such as scripted peers and the integration tests, alongside
/// [`crate::Directive::encode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadReply {
    /// The slot was empty.
    Empty,
    /// The slot held a message.
    Message {
        /// Message status (e.g., `REC READ`).
        status: String,
        /// Sender or destination address.
        address: String,
        /// Timestamp string.
        timestamp: String,
        /// Message body.
        text: String,
    },
}

impl ReadReply {
    /// Parse the full text of a read reply.
    ///
    /// Format: `+CMGR: "<status>","<address>",,"<timestamp>"\r\n<text>\r\nOK\r\n`
    /// or `+CMGR: 0\r\nOK\r\n`.
    pub fn parse(reply: &str) -> ProtocolResult<ReadReply> {
        let body = reply
            .strip_suffix("\r\nOK\r\n")
            .ok_or_else(|| ProtocolError::ParseError(format!("missing final OK: {:?}", reply)))?;

        let (header, text) = match body.split_once("\r\n") {
            Some((header, text)) => (header, Some(text)),
            None => (body, None),
        };

        let fields = header
            .strip_prefix("+CMGR: ")
            .ok_or_else(|| ProtocolError::ParseError(format!("unexpected header: {}", header)))?;

        if fields == "0" && text.is_none() {
            return Ok(ReadReply::Empty);
        }

        let text = text.ok_or_else(|| {
            ProtocolError::ParseError(format!("missing message text: {:?}", reply))
        })?;

        // "<status>","<address>",,"<timestamp>"
        let parts: Vec<&str> = fields.split(',').collect();
        if parts.len() < 4 {
            return Err(ProtocolError::ParseError(format!(
                "expected at least 4 fields, got {}: {}",
                parts.len(),
                fields
            )));
        }

        let unquote = |s: &str| s.trim_matches('"').to_string();
        Ok(ReadReply::Message {
            status: unquote(parts[0]),
            address: unquote(parts[1]),
            timestamp: unquote(&parts[3..].join(",")),
            text: text.to_string(),
        })
    }
}
