//! Compose sub-protocol state.
//!
//! ```text
//!            AT+CMGS=<address>
//! ┌──────┐ ─────────────────────> ┌──────────────────┐
//! │ Idle │                        │ ComposingMessage │
//! └──────┘ <───────────────────── └──────────────────┘
//!             any next line
//!          (stored as message text)
//! ```
//!
//! The pending address exists only inside `ComposingMessage`, so it is set
//! exactly when a composition is in progress. There is no timeout: the state
//! waits for the next line however long that takes.

/// The dispatcher's mode between lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Lines are commands.
    #[default]
    Idle,
    /// The next line is message text for `address`.
    ComposingMessage {
        /// Destination captured from the compose directive.
        address: String,
    },
}

impl SessionState {
    /// Check whether a composition is in progress.
    pub fn is_composing(&self) -> bool {
        matches!(self, SessionState::ComposingMessage { .. })
    }

    /// The pending destination address, if composing.
    pub fn pending_address(&self) -> Option<&str> {
        match self {
            SessionState::ComposingMessage { address } => Some(address),
            SessionState::Idle => None,
        }
    }

    /// Enter `ComposingMessage` for `address`.
    pub fn begin_compose(&mut self, address: String) {
        *self = SessionState::ComposingMessage { address };
    }

    /// Return to `Idle`, yielding the pending address if there was one.
    pub fn finish_compose(&mut self) -> Option<String> {
        match std::mem::take(self) {
            SessionState::ComposingMessage { address } => Some(address),
            SessionState::Idle => None,
        }
    }
}
