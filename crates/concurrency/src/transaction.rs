//! Client-facing transaction handle
//!
//! A `Transaction` is a thin capability binding a transaction id to its
//! owning store; every method is a one-to-one forward to the store's
//! transactional surface. The handle belongs to the client that opened it;
//! the engine does not synchronise concurrent use of a single handle.

use crate::store::MemStore;
use std::fmt;
use strand_core::{Key, Result, TxId, Value};

/// A handle to one open transaction.
///
/// Obtained from [`MemStore::begin`]. Reads observe a snapshot fixed when the
/// transaction opened, shadowed by the transaction's own staged writes.
/// [`commit`](Transaction::commit) applies the staged batch atomically under
/// an optimistic conflict check; [`abort`](Transaction::abort) discards it.
///
/// A failed commit leaves the handle open with its staged writes intact, so
/// callers can re-read, re-stage, and try again. After a successful commit or
/// an abort, every further call fails with
/// [`Error::TransactionNotFound`](strand_core::Error::TransactionNotFound).
pub struct Transaction {
    store: MemStore,
    tx_id: TxId,
}

impl Transaction {
    pub(crate) fn new(store: MemStore, tx_id: TxId) -> Self {
        Transaction { store, tx_id }
    }

    /// The id this transaction was opened with.
    pub fn id(&self) -> TxId {
        self.tx_id
    }

    /// Read a key: staged writes first, then the snapshot.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<Option<Value>> {
        self.store.tx_get(self.tx_id, key)
    }

    /// Stage a write for commit.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<()> {
        self.store.tx_set(self.tx_id, key, value)
    }

    /// Stage a delete for commit.
    ///
    /// The key must be staged already or visible in this transaction's
    /// snapshot.
    pub fn delete(&self, key: impl AsRef<[u8]>) -> Result<()> {
        self.store.tx_delete(self.tx_id, key)
    }

    /// Atomically apply every staged intent.
    pub fn commit(&self) -> Result<()> {
        self.store.commit(self.tx_id)
    }

    /// Discard every staged intent.
    pub fn abort(&self) -> Result<()> {
        self.store.abort(self.tx_id)
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("tx_id", &self.tx_id)
            .finish()
    }
}
