//! Per-connection emulator session.

use std::sync::Arc;

use fakemodem_metrics::SessionLabels;
use fakemodem_protocol::{Frame, LineFramer, Reply};
use tracing::{info, warn};

use crate::config::ModemProfile;
use crate::dispatcher::{Dispatcher, SessionStats};
use crate::session::SessionState;
use crate::store::MessageStore;

/// Everything one connection owns: input buffer, compose state and message
/// store. Only the profile is shared.
///
/// Every non-empty line produces exactly one reply before the next byte is
/// framed.
#[derive(Debug)]
pub struct ModemSession {
    id: u64,
    framer: LineFramer,
    dispatcher: Dispatcher,
}

impl ModemSession {
    /// Create a session for an unnamed transport.
    pub fn new(id: u64, profile: Arc<ModemProfile>) -> Self {
        Self::with_transport(id, profile, "local")
    }

    /// Create a session, labelling its metrics with `transport`.
    pub fn with_transport(id: u64, profile: Arc<ModemProfile>, transport: &str) -> Self {
        let framer = LineFramer::with_limit(profile.max_line_length, profile.overflow_policy);
        let labels = SessionLabels::new(id, transport);
        ModemSession {
            id,
            framer,
            dispatcher: Dispatcher::new(profile, &labels),
        }
    }

    /// Feed one received byte, returning the reply if it completed a line.
    pub fn feed(&mut self, byte: u8) -> Option<Reply> {
        let discarded = self.framer.discarded_bytes();
        let frame = self.framer.feed(byte);
        let dropped = self.framer.discarded_bytes() - discarded;
        if dropped > 0 {
            self.dispatcher.record_discarded(dropped);
        }

        let reply = match frame? {
            Frame::Line(line) => {
                info!(session = self.id, "> {}", line);
                self.dispatcher.dispatch(&line)
            }
            Frame::Overflow { max, actual } => {
                warn!(session = self.id, max, actual, "command line too long");
                self.dispatcher.reject_overflow()
            }
        };
        Some(reply)
    }

    /// Feed a chunk of received bytes, collecting the replies in order.
    pub fn feed_all(&mut self, data: &[u8]) -> Vec<Reply> {
        data.iter().filter_map(|&byte| self.feed(byte)).collect()
    }

    /// Session identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current compose state.
    pub fn state(&self) -> &SessionState {
        self.dispatcher.state()
    }

    /// This session's message store.
    pub fn store(&self) -> &MessageStore {
        self.dispatcher.store()
    }

    /// Bytes received but not yet terminated.
    pub fn pending_input(&self) -> usize {
        self.framer.buffered_len()
    }

    /// Traffic counters so far.
    pub fn stats(&self) -> SessionStats {
        self.dispatcher.stats()
    }
}
