//! Command normalization and the SMS directives.
//!
//! Plain commands are matched by exact string after [`normalize`]. Only two
//! commands are recognized by pattern, because they carry an argument:
//! - `AT+CMGS=<address>[,<type>]` starts composing a message
//! - `AT+CMGR=<slot>` reads a stored message

use tracing::debug;

use crate::codec::LineFramer;
use crate::error::{ProtocolError, ProtocolResult};

/// Prefix of the compose-message directive.
pub const SEND_MESSAGE_PREFIX: &str = "AT+CMGS=";

/// Prefix of the read-message directive.
pub const READ_MESSAGE_PREFIX: &str = "AT+CMGR=";

/// Address recorded when the compose directive carries no usable address.
pub const UNKNOWN_ADDRESS: &str = "Unknown";

/// Normalize a command line for table lookup: trimmed and upper-cased.
pub fn normalize(line: &str) -> String {
    line.trim().to_uppercase()
}

/// A directive recognized by pattern rather than by exact table lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Compose a message to the given address (`AT+CMGS=`).
    ///
    /// The address keeps the letter-case of the received line.
    SendMessage {
        /// Destination address, quotes stripped.
        address: String,
    },

    /// Read the message stored in a slot (`AT+CMGR=`).
    ReadMessage {
        /// One-based slot index.
        slot: u32,
    },
}

impl Directive {
    /// Recognize a directive in a trimmed command line.
    ///
    /// Returns `None` for lines that should go to the command table. A
    /// compose directive whose address cannot be extracted still parses,
    /// with [`UNKNOWN_ADDRESS`] as the address.
    pub fn parse(line: &str) -> Option<Directive> {
        let line = line.trim();

        if let Some(slot) = strip_prefix_ignore_case(line, READ_MESSAGE_PREFIX)
            .and_then(|arg| parse_slot(arg).ok())
        {
            return Some(Directive::ReadMessage { slot });
        }

        if let Some(argument) = strip_prefix_ignore_case(line, SEND_MESSAGE_PREFIX) {
            let address = parse_address(argument).unwrap_or_else(|err| {
                debug!(%err, "using placeholder address");
                UNKNOWN_ADDRESS.to_string()
            });
            return Some(Directive::SendMessage { address });
        }

        None
    }

    /// Encode the directive as a line to send to the modem.
    /// Returns the bytes to send (including the `\r` terminator).
    pub fn encode(&self) -> Vec<u8> {
        LineFramer::encode_command(&self.to_command_string())
    }

    /// Get the command string without the terminator.
    pub fn to_command_string(&self) -> String {
        match self {
            Directive::SendMessage { address } => {
                format!("{}\"{}\"", SEND_MESSAGE_PREFIX, address)
            }
            Directive::ReadMessage { slot } => format!("{}{}", READ_MESSAGE_PREFIX, slot),
        }
    }
}

/// Extract the destination address from a compose directive argument.
///
/// The address is the text up to an optional `,<type>` suffix, trimmed,
/// with surrounding double quotes removed.
pub fn parse_address(argument: &str) -> ProtocolResult<String> {
    let field = argument.split(',').next().unwrap_or_default().trim();
    let address = field.trim_matches('"').trim();
    if address.is_empty() {
        return Err(ProtocolError::InvalidArgument(format!(
            "no address in {:?}",
            argument
        )));
    }
    Ok(address.to_string())
}

/// Parse a one-based slot index made only of ASCII digits.
///
/// Inner whitespace is not tolerated: `AT+CMGR= 1` is not a read directive.
pub fn parse_slot(argument: &str) -> ProtocolResult<u32> {
    if argument.is_empty() || !argument.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProtocolError::InvalidArgument(format!(
            "invalid slot {:?}",
            argument
        )));
    }
    match argument.parse::<u32>() {
        Ok(slot) if slot > 0 => Ok(slot),
        _ => Err(ProtocolError::InvalidArgument(format!(
            "slot out of range: {}",
            argument
        ))),
    }
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        line.get(prefix.len()..)
    } else {
        None
    }
}
