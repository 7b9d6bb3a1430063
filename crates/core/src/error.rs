//! Error types for the Strand engine
//!
//! A single unified error enum covers the whole public surface. We use
//! `thiserror` for the `Display` and `Error` trait implementations.
//!
//! Every error propagates directly to the caller: the engine never retries
//! internally and never applies a transaction partially. A failed commit
//! leaves both the store and the failing transaction's write-set untouched,
//! so `is_conflict()` is the hook callers use to drive their own retry loops.

use crate::types::{Key, TxId};
use thiserror::Error;

/// Result type alias for Strand operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the Strand engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A delete targeted a key with no visible committed version and no
    /// staged write in the same transaction.
    #[error("key {0:?} does not exist")]
    KeyNotFound(Key),

    /// A handle operation referenced a transaction id that is not open:
    /// never opened, already committed, or already aborted.
    #[error("transaction {0} does not exist")]
    TransactionNotFound(TxId),

    /// Commit validation detected a concurrent writer. The transaction
    /// remains open with its write-set intact.
    #[error("transaction {0} cannot be committed")]
    TransactionConflict(TxId),
}

impl Error {
    /// Whether this error is a commit-time conflict.
    ///
    /// Used for retry logic; only conflict errors are worth retrying.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::TransactionConflict(_))
    }

    /// Whether this error reports a missing key.
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound(_))
    }

    /// Whether this error reports a transaction that is no longer open.
    pub fn is_transaction_not_found(&self) -> bool {
        matches!(self, Error::TransactionNotFound(_))
    }
}
