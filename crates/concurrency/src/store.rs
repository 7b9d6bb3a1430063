//! The transactional store
//!
//! `MemStore` owns the key → version-chain map, the write-sets of all open
//! transactions, the monotonic transaction counter, and the coarse store lock
//! that serialises commits and structural changes.
//!
//! ## Locking
//!
//! Two lock tiers with a fixed acquisition order: store lock, then write-set
//! lock, then at most one chain lock.
//!
//! - The store lock (`commit_lock`) serialises everything that allocates a
//!   `TxId` or changes transaction lifecycle state: begin, direct set/delete,
//!   commit, abort, and pruning. Holding it across commit's validate and
//!   apply steps is what makes validation results trustworthy at apply time.
//! - Each chain carries its own RwLock, so snapshot reads and direct gets on
//!   distinct keys run in parallel. The chain map itself is a `DashMap`,
//!   which is why direct `get` needs no store lock at all.
//!
//! Write-set handles are cloned out of their map entry before locking, so no
//! map shard lock is ever held while a write-set or chain lock is taken.
//!
//! ## Commit protocol
//!
//! Validation is optimistic and first-committer-wins: a transaction opened at
//! id `t` commits only if no staged key's chain has advanced past `t`. The
//! apply step then allocates one fresh id and stamps every staged intent with
//! it, giving the commit a single atomic logical timestamp. A rejected commit
//! changes nothing; the store state and the write-set both survive for the
//! caller to retry.

use crate::transaction::Transaction;
use crate::write_set::{Intent, WriteSet};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use strand_core::{Config, Error, Key, Result, Timestamp, TxId, Value};
use strand_storage::{Version, VersionChain};
use tracing::{debug, info, warn};

/// Point-in-time counters describing a store.
///
/// Collected without the store lock, so concurrent writers may skew the
/// numbers slightly against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of keys that have ever received a committed write.
    pub keys: usize,
    /// Total version records currently retained across all chains.
    pub versions: usize,
    /// Number of currently open transactions.
    pub open_transactions: usize,
}

struct StoreInner {
    /// Per-key committed history. Entries are created on demand and never
    /// removed; a fully pruned chain stays in the map as an empty chain.
    chains: DashMap<Key, Arc<VersionChain>>,

    /// Write-sets of all open transactions, keyed by their open-time id.
    write_sets: DashMap<TxId, Arc<Mutex<WriteSet>>>,

    /// Monotonic id source. Only advanced while `commit_lock` is held, which
    /// totally orders allocation with every other state-changing event.
    next_tx_id: AtomicU64,

    /// The store lock.
    commit_lock: Mutex<()>,

    config: Config,
}

/// An in-memory MVCC key-value store with interactive transactions.
///
/// Cloning is cheap and hands out another handle to the same store.
///
/// # Example
///
/// ```
/// use strand_concurrency::MemStore;
/// use strand_core::Value;
///
/// let store = MemStore::new();
/// store.set("greeting", "hello");
/// assert_eq!(store.get("greeting"), Some(Value::from("hello")));
///
/// let tx = store.begin();
/// tx.set("greeting", "updated").unwrap();
/// // Staged writes are invisible until commit.
/// assert_eq!(store.get("greeting"), Some(Value::from("hello")));
/// tx.commit().unwrap();
/// assert_eq!(store.get("greeting"), Some(Value::from("updated")));
/// ```
#[derive(Clone)]
pub struct MemStore {
    inner: Arc<StoreInner>,
}

impl MemStore {
    /// Create a store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a store with an explicit configuration.
    pub fn with_config(config: Config) -> Self {
        MemStore {
            inner: Arc::new(StoreInner {
                chains: DashMap::new(),
                write_sets: DashMap::new(),
                next_tx_id: AtomicU64::new(0),
                commit_lock: Mutex::new(()),
                config,
            }),
        }
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Allocate the next transaction id.
    ///
    /// Callers must hold the store lock; that is what makes the returned ids
    /// totally ordered with respect to every other state-changing event.
    ///
    /// # Panics
    ///
    /// Panics if the counter reaches `u64::MAX`.
    fn allocate_tx_id(&self) -> TxId {
        let raw = self
            .inner
            .next_tx_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_add(1))
            .expect("transaction id overflow: u64::MAX reached");
        TxId::from_u64(raw + 1)
    }

    fn chain(&self, key: &[u8]) -> Option<Arc<VersionChain>> {
        self.inner.chains.get(key).map(|entry| Arc::clone(entry.value()))
    }

    fn write_set(&self, tx_id: TxId) -> Result<Arc<Mutex<WriteSet>>> {
        self.inner
            .write_sets
            .get(&tx_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(Error::TransactionNotFound(tx_id))
    }

    // ------------------------------------------------------------------
    // Direct surface: each call is its own implicit committed transaction
    // ------------------------------------------------------------------

    /// Set a key to a value, immediately visible to all subsequent readers.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let _guard = self.inner.commit_lock.lock();
        let tx_id = self.allocate_tx_id();
        self.inner
            .chains
            .entry(key)
            .or_default()
            .append(Version::set(value, tx_id));
        debug!(tx_id = %tx_id, "direct set applied");
    }

    /// Read the latest committed value of a key.
    ///
    /// Never observes uncommitted state; needs no store lock because the
    /// chain map supports concurrent reads.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<Value> {
        self.chain(key.as_ref())
            .and_then(|chain| chain.latest_committed())
    }

    /// Delete a key by appending a tombstone.
    ///
    /// Fails with [`Error::KeyNotFound`] when the key has no chain or its
    /// latest record is already a tombstone.
    pub fn delete(&self, key: impl AsRef<[u8]>) -> Result<()> {
        let key = key.as_ref();
        let _guard = self.inner.commit_lock.lock();
        let chain = self
            .chain(key)
            .filter(|chain| chain.is_present())
            .ok_or_else(|| Error::KeyNotFound(Key::from(key)))?;
        let tx_id = self.allocate_tx_id();
        chain
            .append_tombstone(tx_id)
            .map_err(|_| Error::KeyNotFound(Key::from(key)))?;
        debug!(tx_id = %tx_id, "direct delete applied");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transaction lifecycle
    // ------------------------------------------------------------------

    /// Open a transaction and hand back its handle.
    ///
    /// The handle's reads observe a snapshot fixed at this instant; its
    /// writes stage into a private write-set until commit.
    pub fn begin(&self) -> Transaction {
        let _guard = self.inner.commit_lock.lock();
        let tx_id = self.allocate_tx_id();
        self.inner
            .write_sets
            .insert(tx_id, Arc::new(Mutex::new(WriteSet::new())));
        info!(tx_id = %tx_id, "transaction started");
        Transaction::new(self.clone(), tx_id)
    }

    /// Read a key inside transaction `tx_id`.
    ///
    /// The write-set shadows the chain: a staged Set returns its value and a
    /// staged Delete reads as absent. Otherwise the chain is read at the
    /// transaction's snapshot, so versions newer than `tx_id` and other
    /// transactions' uncommitted state are never observed.
    pub fn tx_get(&self, tx_id: TxId, key: impl AsRef<[u8]>) -> Result<Option<Value>> {
        let key = key.as_ref();
        let write_set = self.write_set(tx_id)?;
        {
            let write_set = write_set.lock();
            match write_set.get(key) {
                Some(Intent::Set(value)) => return Ok(Some(value.clone())),
                Some(Intent::Delete) => return Ok(None),
                None => {}
            }
        }
        Ok(self.chain(key).and_then(|chain| chain.snapshot_at(tx_id)))
    }

    /// Stage a Set inside transaction `tx_id`. Touches no chain.
    pub fn tx_set(&self, tx_id: TxId, key: impl Into<Key>, value: impl Into<Value>) -> Result<()> {
        let write_set = self.write_set(tx_id)?;
        write_set.lock().stage_set(key.into(), value.into());
        debug!(tx_id = %tx_id, "staged set");
        Ok(())
    }

    /// Stage a Delete inside transaction `tx_id`.
    ///
    /// A key already in the write-set has its intent replaced. Otherwise the
    /// key must be visible in the transaction's snapshot; deleting an absent
    /// key fails with [`Error::KeyNotFound`].
    pub fn tx_delete(&self, tx_id: TxId, key: impl AsRef<[u8]>) -> Result<()> {
        let key = key.as_ref();
        let write_set = self.write_set(tx_id)?;
        let mut write_set = write_set.lock();
        if !write_set.contains_key(key) {
            let present = self
                .chain(key)
                .and_then(|chain| chain.snapshot_at(tx_id))
                .is_some();
            if !present {
                return Err(Error::KeyNotFound(Key::from(key)));
            }
        }
        write_set.stage_delete(Key::from(key));
        debug!(tx_id = %tx_id, "staged delete");
        Ok(())
    }

    /// Commit transaction `tx_id`.
    ///
    /// Runs entirely under the store lock: validate every staged key against
    /// its chain, then apply all intents under one freshly allocated id, then
    /// discard the write-set. A validation failure returns
    /// [`Error::TransactionConflict`] and leaves the store and the write-set
    /// exactly as they were, so the transaction stays open and retryable.
    pub fn commit(&self, tx_id: TxId) -> Result<()> {
        let _guard = self.inner.commit_lock.lock();
        let write_set = self.write_set(tx_id)?;
        {
            let write_set = write_set.lock();

            // First-committer-wins: any chain that advanced past this
            // transaction's open id means a concurrent writer got there first.
            for key in write_set.keys() {
                if let Some(chain) = self.inner.chains.get(key.as_bytes()) {
                    if let Some(latest) = chain.latest_tx_id() {
                        if latest > tx_id {
                            warn!(
                                tx_id = %tx_id,
                                key = %key,
                                latest = %latest,
                                "commit rejected, concurrent writer"
                            );
                            return Err(Error::TransactionConflict(tx_id));
                        }
                    }
                }
            }

            // One id for the whole batch makes the commit atomic in logical
            // time. Chains for new keys are created inside this critical
            // section, which is what rejects the second of two concurrent
            // creators of the same key.
            let apply_id = self.allocate_tx_id();
            for (key, intent) in write_set.iter() {
                match intent {
                    Intent::Set(value) => {
                        self.inner
                            .chains
                            .entry(key.clone())
                            .or_default()
                            .append(Version::set(value.clone(), apply_id));
                    }
                    Intent::Delete => {
                        // A staged delete can outlive the key it targeted
                        // (staged set-then-delete of a brand-new key, or the
                        // snapshot saw a value pruning has since dropped).
                        // Applying it to nothing is a no-op, as in a direct
                        // delete race the same caller could never observe.
                        if let Some(chain) = self.inner.chains.get(key.as_bytes()) {
                            let _ = chain.append_tombstone(apply_id);
                        }
                    }
                }
            }

            info!(
                tx_id = %tx_id,
                apply_id = %apply_id,
                keys = write_set.len(),
                "transaction committed"
            );
        }
        self.inner.write_sets.remove(&tx_id);
        Ok(())
    }

    /// Abort transaction `tx_id`, discarding its write-set.
    ///
    /// No chain is touched; aborting an open transaction never fails.
    pub fn abort(&self, tx_id: TxId) -> Result<()> {
        let _guard = self.inner.commit_lock.lock();
        self.inner
            .write_sets
            .remove(&tx_id)
            .ok_or(Error::TransactionNotFound(tx_id))?;
        info!(tx_id = %tx_id, "transaction aborted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    /// Prune obsolete versions from every chain.
    ///
    /// Takes the store lock to quiesce commits, then drops from each chain
    /// the records older than the configured `transaction_timeout`. Returns
    /// the total number of records dropped.
    pub fn prune_versions(&self) -> usize {
        let _guard = self.inner.commit_lock.lock();
        let now = Timestamp::now();
        let ttl = self.inner.config.transaction_timeout;
        let mut dropped = 0;
        for entry in self.inner.chains.iter() {
            dropped += entry.value().prune(now, ttl);
        }
        if dropped > 0 {
            debug!(dropped, "pruned obsolete versions");
        }
        dropped
    }

    /// Point-in-time counters for observability.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            keys: self.inner.chains.len(),
            versions: self
                .inner
                .chains
                .iter()
                .map(|entry| entry.value().len())
                .sum(),
            open_transactions: self.inner.write_sets.len(),
        }
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(s: &str) -> Option<Value> {
        Some(Value::from(s))
    }

    #[test]
    fn test_direct_round_trip() {
        let store = MemStore::new();
        store.set("a", "1");
        assert_eq!(store.get("a"), value("1"));

        store.delete("a").unwrap();
        assert_eq!(store.get("a"), None);

        let err = store.delete("a").unwrap_err();
        assert!(err.is_key_not_found());
    }

    #[test]
    fn test_get_missing_key_is_absent() {
        let store = MemStore::new();
        assert_eq!(store.get("nothing"), None);
    }

    #[test]
    fn test_delete_missing_key_fails() {
        let store = MemStore::new();
        assert!(store.delete("nothing").unwrap_err().is_key_not_found());
    }

    #[test]
    fn test_direct_set_overwrites() {
        let store = MemStore::new();
        store.set("k", "v1");
        store.set("k", "v2");
        assert_eq!(store.get("k"), value("v2"));
    }

    #[test]
    fn test_uncommitted_writes_are_invisible() {
        let store = MemStore::new();
        let tx = store.begin();
        tx.set("k", "x").unwrap();
        assert_eq!(store.get("k"), None);

        tx.commit().unwrap();
        assert_eq!(store.get("k"), value("x"));
    }

    #[test]
    fn test_abort_discards_everything() {
        let store = MemStore::new();
        let tx = store.begin();
        tx.set("k", "y").unwrap();
        tx.abort().unwrap();

        assert_eq!(store.get("k"), None);
        assert!(tx
            .set("k", "z")
            .unwrap_err()
            .is_transaction_not_found());
    }

    #[test]
    fn test_repeatable_read() {
        let store = MemStore::new();
        store.set("k", "v0");

        let a = store.begin();
        let b = store.begin();
        b.set("k", "v1").unwrap();
        b.commit().unwrap();

        // a's snapshot predates b's commit for its whole lifetime.
        assert_eq!(a.get("k").unwrap(), value("v0"));
        assert_eq!(store.get("k"), value("v1"));
    }

    #[test]
    fn test_write_write_conflict_detected() {
        let store = MemStore::new();
        store.set("k", "v0");

        let a = store.begin();
        let b = store.begin();
        a.set("k", "A").unwrap();
        b.set("k", "B").unwrap();

        a.commit().unwrap();
        let err = b.commit().unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.get("k"), value("A"));
    }

    #[test]
    fn test_failed_commit_keeps_transaction_open() {
        let store = MemStore::new();
        store.set("k", "v0");

        let a = store.begin();
        let b = store.begin();
        a.set("k", "A").unwrap();
        b.set("k", "B").unwrap();
        a.commit().unwrap();

        assert!(b.commit().unwrap_err().is_conflict());
        // The write-set survives the failure: still open, still staged.
        assert_eq!(b.get("k").unwrap(), value("B"));
        // And the same commit keeps failing while the conflict stands.
        assert!(b.commit().unwrap_err().is_conflict());
        b.abort().unwrap();
    }

    #[test]
    fn test_staged_delete_then_set_wins() {
        let store = MemStore::new();
        let tx = store.begin();
        tx.set("k", "x").unwrap();
        tx.delete("k").unwrap();
        tx.set("k", "y").unwrap();
        tx.commit().unwrap();

        assert_eq!(store.get("k"), value("y"));
    }

    #[test]
    fn test_staged_set_then_delete_commits_to_nothing() {
        let store = MemStore::new();
        let tx = store.begin();
        tx.set("fresh", "x").unwrap();
        tx.delete("fresh").unwrap();
        tx.commit().unwrap();

        assert_eq!(store.get("fresh"), None);
    }

    #[test]
    fn test_tx_delete_of_missing_key_fails() {
        let store = MemStore::new();
        let tx = store.begin();
        assert!(tx.delete("missing").unwrap_err().is_key_not_found());
        tx.abort().unwrap();
    }

    #[test]
    fn test_tx_delete_respects_snapshot() {
        // A key created after the transaction opened is absent in its
        // snapshot, so deleting it fails even though it exists now.
        let store = MemStore::new();
        let tx = store.begin();
        store.set("late", "v");

        assert!(tx.delete("late").unwrap_err().is_key_not_found());
        tx.abort().unwrap();
    }

    #[test]
    fn test_tx_get_reads_own_staged_state() {
        let store = MemStore::new();
        store.set("k", "committed");

        let tx = store.begin();
        assert_eq!(tx.get("k").unwrap(), value("committed"));

        tx.set("k", "staged").unwrap();
        assert_eq!(tx.get("k").unwrap(), value("staged"));

        tx.delete("k").unwrap();
        assert_eq!(tx.get("k").unwrap(), None);
        tx.abort().unwrap();
    }

    #[test]
    fn test_operations_on_committed_transaction_fail() {
        let store = MemStore::new();
        let tx = store.begin();
        tx.set("k", "v").unwrap();
        tx.commit().unwrap();

        assert!(tx.get("k").unwrap_err().is_transaction_not_found());
        assert!(tx.set("k", "w").unwrap_err().is_transaction_not_found());
        assert!(tx.delete("k").unwrap_err().is_transaction_not_found());
        assert!(tx.commit().unwrap_err().is_transaction_not_found());
        assert!(tx.abort().unwrap_err().is_transaction_not_found());
    }

    #[test]
    fn test_commit_applies_one_atomic_id() {
        let store = MemStore::new();
        let tx = store.begin();
        tx.set("a", "1").unwrap();
        tx.set("b", "2").unwrap();
        tx.commit().unwrap();

        let id_a = store.chain(b"a").unwrap().latest_tx_id().unwrap();
        let id_b = store.chain(b"b").unwrap().latest_tx_id().unwrap();
        assert_eq!(id_a, id_b);
        assert!(id_a > tx.id());
    }

    #[test]
    fn test_tx_ids_are_monotonic() {
        let store = MemStore::new();
        let a = store.begin().id();
        store.set("k", "v");
        let b = store.begin().id();
        assert!(b > a);
        assert_eq!(b.as_u64(), a.as_u64() + 2);
    }

    #[test]
    fn test_conflict_on_concurrently_created_key() {
        // Two transactions race to create the same brand-new key; the chain
        // the winner creates at apply time carries an id above the loser's
        // open id, so the loser is rejected.
        let store = MemStore::new();
        let a = store.begin();
        let b = store.begin();
        a.set("new", "A").unwrap();
        b.set("new", "B").unwrap();

        a.commit().unwrap();
        assert!(b.commit().unwrap_err().is_conflict());
        assert_eq!(store.get("new"), value("A"));
    }

    #[test]
    fn test_direct_write_conflicts_with_open_transaction() {
        let store = MemStore::new();
        store.set("k", "v0");

        let tx = store.begin();
        tx.set("k", "staged").unwrap();
        store.set("k", "direct");

        assert!(tx.commit().unwrap_err().is_conflict());
        assert_eq!(store.get("k"), value("direct"));
    }

    #[test]
    fn test_empty_commit_succeeds() {
        let store = MemStore::new();
        let tx = store.begin();
        tx.commit().unwrap();
    }

    #[test]
    fn test_prune_with_zero_ttl_forgets_history() {
        let store = MemStore::with_config(Config {
            transaction_timeout: std::time::Duration::ZERO,
            ..Config::default()
        });
        store.set("a", "1");
        store.set("b", "2");

        let dropped = store.prune_versions();
        assert_eq!(dropped, 2);
        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("b"), None);

        // Chains stay in the map but hold nothing; the keys read as absent
        // and a delete reports them missing.
        assert!(store.delete("a").unwrap_err().is_key_not_found());
        let stats = store.stats();
        assert_eq!(stats.keys, 2);
        assert_eq!(stats.versions, 0);
    }

    #[test]
    fn test_prune_with_long_ttl_keeps_history() {
        let store = MemStore::new();
        store.set("a", "1");
        store.set("a", "2");
        assert_eq!(store.prune_versions(), 0);
        assert_eq!(store.stats().versions, 2);
    }

    #[test]
    fn test_stats_counts() {
        let store = MemStore::new();
        store.set("a", "1");
        store.set("a", "2");
        store.set("b", "1");
        let tx = store.begin();

        let stats = store.stats();
        assert_eq!(stats.keys, 2);
        assert_eq!(stats.versions, 3);
        assert_eq!(stats.open_transactions, 1);

        tx.abort().unwrap();
        assert_eq!(store.stats().open_transactions, 0);
    }
}
