//! Command dispatcher.
//!
//! Each framed line is routed, in order:
//! 1. to the message store, if a composition is pending (the line is text);
//! 2. to the read directive, `AT+CMGR=<slot>` for a slot this store has;
//! 3. to the compose directive, `AT+CMGS=<address>`;
//! 4. to the command table, answering with the error reply on a miss.

use std::sync::Arc;

use fakemodem_metrics::{metric_defs, SessionLabels};
use fakemodem_protocol::{normalize, Directive, Reply};
use tracing::{debug, trace};

use crate::config::{CmeeMode, ModemProfile, Verbosity};
use crate::session::SessionState;
use crate::store::{MessageStore, StoredMessage};

/// Counters describing one session's traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Non-empty lines dispatched (message text included).
    pub lines: u64,
    /// Lines answered with the unknown-command error.
    pub unknown_commands: u64,
    /// Messages written to the store.
    pub messages_stored: u64,
    /// Lines rejected for exceeding the line limit.
    pub overflowed_lines: u64,
    /// Bytes dropped as undecodable.
    pub discarded_bytes: u64,
}

/// Routes framed lines for one session and owns its mutable state.
#[derive(Debug)]
pub struct Dispatcher {
    profile: Arc<ModemProfile>,
    state: SessionState,
    store: MessageStore,
    /// Active error verbosity; starts at the profile's and only moves in
    /// [`CmeeMode::Live`].
    verbosity: Verbosity,
    labels: Vec<(&'static str, String)>,
    stats: SessionStats,
}

impl Dispatcher {
    /// Create a dispatcher in `Idle` with an empty store.
    pub fn new(profile: Arc<ModemProfile>, labels: &SessionLabels) -> Self {
        Dispatcher {
            store: MessageStore::new(profile.message_slots),
            verbosity: profile.verbosity,
            profile,
            state: SessionState::default(),
            labels: labels.to_labels(),
            stats: SessionStats::default(),
        }
    }

    /// Produce the reply to one trimmed, non-empty line.
    pub fn dispatch(&mut self, line: &str) -> Reply {
        self.stats.lines += 1;
        metrics::counter!(metric_defs::COMMANDS_RECEIVED.name, &self.labels).increment(1);

        if let Some(address) = self.state.finish_compose() {
            return self.store_message(address, line);
        }

        match Directive::parse(line) {
            Some(Directive::ReadMessage { slot }) if self.store.has_slot(slot) => {
                return self.read_message(slot);
            }
            Some(Directive::SendMessage { address }) => {
                debug!(%address, "composing message");
                self.state.begin_compose(address);
                return Reply::Prompt;
            }
            _ => {}
        }

        self.lookup(&normalize(line))
    }

    /// Produce the reply to a line that exceeded the line limit.
    ///
    /// A pending composition is abandoned: the oversized text is never stored.
    pub fn reject_overflow(&mut self) -> Reply {
        self.stats.overflowed_lines += 1;
        metrics::counter!(metric_defs::LINES_OVERFLOWED.name, &self.labels).increment(1);

        if let Some(address) = self.state.finish_compose() {
            debug!(%address, "composition abandoned");
        }
        self.error_reply()
    }

    /// Account for received bytes the framer dropped as undecodable.
    pub fn record_discarded(&mut self, bytes: u64) {
        self.stats.discarded_bytes += bytes;
        metrics::counter!(metric_defs::DISCARDED_BYTES.name, &self.labels).increment(bytes);
        trace!(bytes, "undecodable input dropped");
    }

    /// Current compose state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// This session's message store.
    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Active error verbosity.
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Traffic counters so far.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    fn store_message(&mut self, address: String, text: &str) -> Reply {
        metrics::histogram!(metric_defs::SMS_LENGTH.name, &self.labels).record(text.len() as f64);
        let slot = self.store.store(StoredMessage {
            address,
            text: text.to_string(),
        });
        self.stats.messages_stored += 1;
        metrics::counter!(metric_defs::SMS_STORED.name, &self.labels).increment(1);
        debug!(slot, "message stored");
        Reply::message_stored(slot)
    }

    fn read_message(&self, slot: u32) -> Reply {
        match self.store.get(slot) {
            Some(message) => Reply::message(&message.address, &message.text),
            None => Reply::no_message(),
        }
    }

    fn lookup(&mut self, normalized: &str) -> Reply {
        let Some(template) = self.profile.table.resolve(normalized) else {
            self.stats.unknown_commands += 1;
            metrics::counter!(metric_defs::COMMANDS_UNKNOWN.name, &self.labels).increment(1);
            debug!(command = normalized, "unknown command");
            return self.error_reply();
        };

        let reply = Reply::template(template);
        if self.profile.cmee_mode == CmeeMode::Live {
            self.apply_cmee(normalized);
        }
        reply
    }

    fn apply_cmee(&mut self, normalized: &str) {
        let verbosity = match normalized {
            "AT+CMEE=0" => Verbosity::Terse,
            "AT+CMEE=1" | "AT+CMEE=2" => Verbosity::Verbose,
            _ => return,
        };
        trace!(?verbosity, "error verbosity changed");
        self.verbosity = verbosity;
    }

    fn error_reply(&self) -> Reply {
        Reply::error(self.verbosity.is_verbose())
    }
}
