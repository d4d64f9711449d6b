//! Emulator configuration and the shared, immutable profile built from it.

use std::collections::BTreeMap;
use std::time::Duration;

use fakemodem_protocol::{OverflowPolicy, DEFAULT_MAX_LINE_LENGTH};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::table::CommandTable;

// ============================================================================
// Policy Types
// ============================================================================

/// Format of the unknown-command error reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// `ERROR`
    #[default]
    Terse,
    /// `+CME ERROR: invalid command`
    Verbose,
}

impl Verbosity {
    /// Map the `verbose_errors` flag to a policy.
    pub fn from_flag(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Terse
        }
    }

    /// Check whether extended errors are selected.
    pub fn is_verbose(&self) -> bool {
        *self == Verbosity::Verbose
    }
}

/// How `AT+CMEE=<n>` table entries affect error verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmeeMode {
    /// The commands are answered from the table and change nothing.
    #[default]
    Cosmetic,
    /// `AT+CMEE=0` selects terse errors, `AT+CMEE=1` and `AT+CMEE=2` verbose
    /// ones, for the session that sent them.
    Live,
}

// ============================================================================
// Configuration
// ============================================================================

/// Default read timeout of the transport, in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Emulator configuration, as loaded from a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    /// Start with extended (`+CME ERROR`) error replies.
    pub verbose_errors: bool,
    /// Whether `AT+CMEE=<n>` changes verbosity.
    pub cmee_mode: CmeeMode,
    /// Maximum command line length in bytes.
    pub max_line_length: usize,
    /// What to do with lines longer than `max_line_length`.
    pub overflow_policy: OverflowPolicy,
    /// Number of message slots.
    pub message_slots: u32,
    /// Transport read timeout in milliseconds.
    pub read_timeout_ms: u64,
    /// Start from an empty table instead of the built-in one.
    pub replace_default_commands: bool,
    /// Extra or overriding table entries.
    pub commands: BTreeMap<String, String>,
}

impl Default for ModemConfig {
    fn default() -> Self {
        ModemConfig {
            verbose_errors: false,
            cmee_mode: CmeeMode::default(),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            overflow_policy: OverflowPolicy::default(),
            message_slots: 1,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            replace_default_commands: false,
            commands: BTreeMap::new(),
        }
    }
}

impl ModemConfig {
    /// Check the settings the engine depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_line_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_line_length",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.message_slots == 0 {
            return Err(ConfigError::InvalidValue {
                field: "message_slots",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "read_timeout_ms",
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(command) = self.commands.keys().find(|c| c.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "commands",
                reason: format!("empty command {:?}", command),
            });
        }
        Ok(())
    }

    /// Transport read timeout.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Validate and build the shared profile.
    pub fn build_profile(&self) -> Result<ModemProfile, ConfigError> {
        self.validate()?;

        let mut table = if self.replace_default_commands {
            CommandTable::new()
        } else {
            CommandTable::reference()
        };
        table.extend(self.commands.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        Ok(ModemProfile {
            table,
            verbosity: Verbosity::from_flag(self.verbose_errors),
            cmee_mode: self.cmee_mode,
            max_line_length: self.max_line_length,
            overflow_policy: self.overflow_policy,
            message_slots: self.message_slots,
        })
    }
}

// ============================================================================
// Profile
// ============================================================================

/// Read-only settings shared by every session.
///
/// Built once at startup; sessions hold it behind an `Arc` and never mutate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModemProfile {
    /// Command → reply template table.
    pub table: CommandTable,
    /// Initial error verbosity.
    pub verbosity: Verbosity,
    /// Whether `AT+CMEE=<n>` changes verbosity.
    pub cmee_mode: CmeeMode,
    /// Maximum command line length in bytes.
    pub max_line_length: usize,
    /// Overflow handling for long lines.
    pub overflow_policy: OverflowPolicy,
    /// Number of message slots per session.
    pub message_slots: u32,
}

impl Default for ModemProfile {
    fn default() -> Self {
        ModemProfile {
            table: CommandTable::reference(),
            verbosity: Verbosity::default(),
            cmee_mode: CmeeMode::default(),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            overflow_policy: OverflowPolicy::default(),
            message_slots: 1,
        }
    }
}
