//! Per-key version chains
//!
//! A `VersionChain` is the append-ordered committed history of one key,
//! guarded by its own reader/writer lock so snapshot reads on distinct keys
//! never contend with each other.
//!
//! # Invariants
//!
//! - `tx_id` is strictly increasing along the chain (callers allocate ids
//!   under the store lock, which guarantees the precondition).
//! - The chain is append-only at the tail between pruning passes; pruning
//!   drops a prefix but never rewrites surviving records.
//! - The latest record's visibility decides whether the key is currently
//!   present; an empty chain is equivalent to "key does not exist".

use crate::version::Version;
use parking_lot::RwLock;
use smallvec::SmallVec;
use std::time::Duration;
use strand_core::{Timestamp, TxId, Value};
use thiserror::Error;

/// Most keys see a handful of versions between pruning passes; keep the
/// common case inline.
type Versions = SmallVec<[Version; 4]>;

/// Chain-level failure reported by mutations.
///
/// The chain does not know which key it belongs to; the store maps these
/// onto its key-carrying error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The chain has no versions at all.
    #[error("version chain is empty")]
    Empty,
    /// The latest version is a tombstone; the key is already deleted.
    #[error("latest version is a tombstone")]
    Deleted,
}

/// The committed version history of a single key.
#[derive(Debug, Default)]
pub struct VersionChain {
    versions: RwLock<Versions>,
}

impl VersionChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a version as the new tail.
    ///
    /// Callers must hand in a `tx_id` greater than the current tail's; the
    /// store lock makes that ordering free for every caller in the engine.
    pub fn append(&self, version: Version) {
        let mut versions = self.versions.write();
        debug_assert!(
            versions.last().map_or(true, |tail| tail.tx_id() < version.tx_id()),
            "version ids must be strictly increasing along a chain"
        );
        versions.push(version);
    }

    /// Append a tombstone produced by `tx_id`, failing when the key is not
    /// currently present.
    pub fn append_tombstone(&self, tx_id: TxId) -> Result<(), ChainError> {
        let mut versions = self.versions.write();
        match versions.last() {
            None => Err(ChainError::Empty),
            Some(tail) if !tail.is_visible() => Err(ChainError::Deleted),
            Some(_) => {
                versions.push(Version::tombstone(tx_id));
                Ok(())
            }
        }
    }

    /// The latest committed value, or `None` when the chain is empty or its
    /// tail is a tombstone.
    pub fn latest_committed(&self) -> Option<Value> {
        let versions = self.versions.read();
        versions.last().and_then(|tail| tail.value().cloned())
    }

    /// Whether the key is currently present (tail exists and is visible).
    pub fn is_present(&self) -> bool {
        let versions = self.versions.read();
        versions.last().map_or(false, Version::is_visible)
    }

    /// The value this key had at the logical instant immediately after
    /// transaction `tx_id` began.
    ///
    /// Scans tail-to-head for the first version with an id at or below
    /// `tx_id`; a tombstone there, a match before every record, or an empty
    /// chain all read as absent.
    pub fn snapshot_at(&self, tx_id: TxId) -> Option<Value> {
        let versions = self.versions.read();
        versions
            .iter()
            .rev()
            .find(|version| version.tx_id() <= tx_id)
            .and_then(|version| version.value().cloned())
    }

    /// The tail's transaction id, or `None` when no versions exist.
    pub fn latest_tx_id(&self) -> Option<TxId> {
        let versions = self.versions.read();
        versions.last().map(Version::tx_id)
    }

    /// Drop obsolete history, retaining exactly the suffix whose records all
    /// satisfy `now - created_at < ttl`. Returns the number of records
    /// dropped.
    pub fn prune(&self, now: Timestamp, ttl: Duration) -> usize {
        let mut versions = self.versions.write();
        let cut = versions
            .iter()
            .rposition(|version| now.saturating_duration_since(version.created_at()) >= ttl)
            .map_or(0, |index| index + 1);
        if cut > 0 {
            versions.drain(..cut);
        }
        cut
    }

    /// Number of retained versions.
    pub fn len(&self) -> usize {
        self.versions.read().len()
    }

    /// Whether the chain holds no versions.
    pub fn is_empty(&self) -> bool {
        self.versions.read().is_empty()
    }

    #[cfg(test)]
    fn push_raw(&self, version: Version) {
        self.versions.write().push(version);
    }
}
