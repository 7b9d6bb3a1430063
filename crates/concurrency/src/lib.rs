//! Concurrency layer for Strand
//!
//! This crate implements the transactional store:
//! - WriteSet: Per-transaction staged intents, last write wins per key
//! - MemStore: Chains, transaction lifecycle, optimistic commit, pruning
//! - Transaction: Client handle forwarding to its owning store
//!
//! Isolation is repeatable read: a transaction's reads observe the snapshot
//! at its open id for its whole lifetime. Conflicts are detected at commit
//! time, first committer wins, and a rejected commit leaves the transaction
//! open for retry.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod store;
pub mod transaction;
pub mod write_set;

pub use store::{MemStore, StoreStats};
pub use transaction::Transaction;
pub use write_set::{Intent, WriteSet};
