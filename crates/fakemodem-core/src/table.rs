//! Command table: exact-match lookup from command text to reply template.

use std::collections::HashMap;

use fakemodem_protocol::normalize;

use crate::defaults::REFERENCE_COMMANDS;

/// Immutable mapping from normalized command text to a reply template.
///
/// Keys are stored normalized (trimmed, upper-cased), so a table built from
/// `"at+cgmi"` answers `"AT+CGMI"`. Templates are returned unmodified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandTable {
    entries: HashMap<String, String>,
}

impl CommandTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The table of the reference device.
    pub fn reference() -> Self {
        REFERENCE_COMMANDS.iter().copied().collect()
    }

    /// Add or replace an entry, returning the previous template if any.
    pub fn insert(&mut self, command: &str, template: impl Into<String>) -> Option<String> {
        self.entries.insert(normalize(command), template.into())
    }

    /// Look up an already-normalized command.
    pub fn resolve(&self, normalized: &str) -> Option<&str> {
        self.entries.get(normalized).map(String::as_str)
    }

    /// Look up a raw command line, normalizing it first.
    pub fn lookup(&self, command: &str) -> Option<&str> {
        self.resolve(&normalize(command))
    }

    /// Check whether a raw command line has an entry.
    pub fn contains(&self, command: &str) -> bool {
        self.lookup(command).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(normalized command, template)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for CommandTable {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut table = CommandTable::new();
        table.extend(iter);
        table
    }
}

impl<'a> Extend<(&'a str, &'a str)> for CommandTable {
    fn extend<I: IntoIterator<Item = (&'a str, &'a str)>>(&mut self, iter: I) {
        for (command, template) in iter {
            self.insert(command, template);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_table_complete() {
        let table = CommandTable::reference();
        assert_eq!(table.len(), REFERENCE_COMMANDS.len());
        assert_eq!(table.lookup("AT"), Some("OK\r\n"));
        assert_eq!(table.lookup("AT+CGMM"), Some("Celer900\r\nOK\r\n"));
    }

    #[test]
    fn test_lookup_is_case_and_whitespace_insensitive() {
        let table = CommandTable::reference();
        assert_eq!(table.lookup("  at+cgmi  "), Some("CelerLab\r\nOK\r\n"));
        assert_eq!(table.lookup("At+CpIn?"), Some("+CPIN: READY\rOK\r\n"));
    }

    #[test]
    fn test_keys_normalized_on_insert() {
        let mut table = CommandTable::new();
        table.insert(" at+custom ", "+CUSTOM: 1\r\nOK\r\n");
        assert_eq!(table.resolve("AT+CUSTOM"), Some("+CUSTOM: 1\r\nOK\r\n"));
        assert!(table.contains("AT+custom"));
    }

    #[test]
    fn test_insert_replaces() {
        let mut table = CommandTable::reference();
        let old = table.insert("AT", "OK\r");
        assert_eq!(old.as_deref(), Some("OK\r\n"));
        assert_eq!(table.lookup("AT"), Some("OK\r"));
    }

    #[test]
    fn test_no_prefix_matching() {
        let table = CommandTable::reference();
        assert_eq!(table.lookup("AT+CGM"), None);
        assert_eq!(table.lookup("AT+CGMII"), None);
        assert_eq!(table.lookup(""), None);
    }

    #[test]
    fn test_templates_keep_mixed_terminators() {
        let table = CommandTable::reference();
        assert_eq!(table.lookup("ATZ"), Some("Modem reset\nOK\r\n"));
        assert_eq!(table.lookup("AT+CGDCONT=1,\"IP\",\"internet\""), Some("\rOK\r\n"));
    }
}
