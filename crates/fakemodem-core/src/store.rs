//! Message store for the SMS compose/read sub-protocol.

use std::collections::BTreeMap;

/// One stored message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    /// Destination address given to the compose directive.
    pub address: String,
    /// Message body.
    pub text: String,
}

/// Slot-indexed message storage owned by one session.
///
/// A slot is either empty or holds one complete message; aborted
/// compositions never reach the store. Slots are numbered from 1 to
/// `capacity`.
#[derive(Debug, Clone)]
pub struct MessageStore {
    /// Slot → (write sequence, message).
    slots: BTreeMap<u32, (u64, StoredMessage)>,
    capacity: u32,
    next_sequence: u64,
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new(1)
    }
}

impl MessageStore {
    /// Create a store with the given number of slots (at least one).
    pub fn new(capacity: u32) -> Self {
        MessageStore {
            slots: BTreeMap::new(),
            capacity: capacity.max(1),
            next_sequence: 0,
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check whether every slot is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Check whether `slot` is a valid index for this store.
    pub fn has_slot(&self, slot: u32) -> bool {
        (1..=self.capacity).contains(&slot)
    }

    /// Get the message in `slot`, if any.
    pub fn get(&self, slot: u32) -> Option<&StoredMessage> {
        self.slots.get(&slot).map(|(_, message)| message)
    }

    /// Store a message and return the slot it was written to.
    ///
    /// The lowest empty slot is used; when the store is full the slot
    /// holding the oldest message is overwritten.
    pub fn store(&mut self, message: StoredMessage) -> u32 {
        let slot = self.next_slot();
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.slots.insert(slot, (sequence, message));
        slot
    }

    /// Iterate over occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &StoredMessage)> {
        self.slots.iter().map(|(slot, (_, message))| (*slot, message))
    }

    fn next_slot(&self) -> u32 {
        (1..=self.capacity)
            .find(|slot| !self.slots.contains_key(slot))
            .or_else(|| {
                self.slots
                    .iter()
                    .min_by_key(|(_, (sequence, _))| *sequence)
                    .map(|(slot, _)| *slot)
            })
            .unwrap_or(1)
    }
}
