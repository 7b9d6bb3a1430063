//! Staged, uncommitted intents of one open transaction
//!
//! A write-set maps each key to the last intent staged for it: either
//! `Set(value)` or `Delete`. There is no history: staging a new intent for a
//! key replaces the previous one, so a Set after a staged Delete simply wins.
//!
//! Whether a Delete is allowed for an unstaged key is not this type's call;
//! only the store can consult the version chain for pre-existence, so the
//! store performs that check before staging.

use rustc_hash::FxHashMap;
use strand_core::{Key, Value};

/// A staged mutation for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Write this value at commit.
    Set(Value),
    /// Delete the key at commit.
    Delete,
}

/// The staged intents of one open transaction, last write wins per key.
#[derive(Debug, Default)]
pub struct WriteSet {
    intents: FxHashMap<Key, Intent>,
}

impl WriteSet {
    /// Create an empty write-set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a Set intent, replacing any earlier intent for the key.
    pub fn stage_set(&mut self, key: Key, value: Value) {
        self.intents.insert(key, Intent::Set(value));
    }

    /// Stage a Delete intent, replacing any earlier intent for the key.
    pub fn stage_delete(&mut self, key: Key) {
        self.intents.insert(key, Intent::Delete);
    }

    /// The staged intent for a key.
    ///
    /// `None` means the key is not in the write-set at all (distinct from a
    /// staged Delete), so the caller knows to fall back to the version chain.
    pub fn get(&self, key: &[u8]) -> Option<&Intent> {
        self.intents.get(key)
    }

    /// Whether any intent is staged for the key.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.intents.contains_key(key)
    }

    /// Iterate over all staged intents.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Intent)> {
        self.intents.iter()
    }

    /// Iterate over all staged keys.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.intents.keys()
    }

    /// Number of staged keys.
    pub fn len(&self) -> usize {
        self.intents.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}
