//! Embeddable engine facade
//!
//! `Database` bundles a [`MemStore`] with the background [`VersionCleaner`]
//! so embedders get working garbage collection without wiring their own
//! scheduler. The store handle stays available for callers that want to run
//! pruning themselves.

use crate::cleaner::VersionCleaner;
use std::thread::JoinHandle;
use strand_concurrency::{MemStore, StoreStats, Transaction};
use strand_core::{Config, Key, Result, Value};
use tracing::debug;

/// An in-memory transactional database with background version cleanup.
///
/// Dropping the database stops the cleaner thread. All data is lost when the
/// last store handle goes away; there is no persistence.
///
/// # Example
///
/// ```
/// use strand_engine::Database;
/// use strand_core::Value;
///
/// let db = Database::new();
/// db.set("user:1", "alice");
///
/// let tx = db.begin();
/// tx.set("user:2", "bob").unwrap();
/// tx.commit().unwrap();
///
/// assert_eq!(db.get("user:2"), Some(Value::from("bob")));
/// ```
pub struct Database {
    store: MemStore,
    cleaner: VersionCleaner,
    worker: Option<JoinHandle<()>>,
}

impl Database {
    /// Create a database with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a database with an explicit configuration and start its
    /// cleaner.
    pub fn with_config(config: Config) -> Self {
        let prune_interval = config.prune_interval;
        let store = MemStore::with_config(config);
        let cleaner = VersionCleaner::new(store.clone(), prune_interval);
        let worker = Some(cleaner.start());
        debug!(?prune_interval, "database opened");
        Database {
            store,
            cleaner,
            worker,
        }
    }

    /// A handle to the underlying store.
    pub fn store(&self) -> &MemStore {
        &self.store
    }

    /// Set a key to a value, immediately visible to all readers.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) {
        self.store.set(key, value)
    }

    /// Read the latest committed value of a key.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<Value> {
        self.store.get(key)
    }

    /// Delete a key.
    pub fn delete(&self, key: impl AsRef<[u8]>) -> Result<()> {
        self.store.delete(key)
    }

    /// Open a transaction.
    pub fn begin(&self) -> Transaction {
        self.store.begin()
    }

    /// Run a pruning pass right now, in addition to the background cadence.
    pub fn prune_versions(&self) -> usize {
        self.store.prune_versions()
    }

    /// Point-in-time store counters.
    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.cleaner.shutdown();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
