//! Storage layer for Strand
//!
//! This crate implements the versioned history that backs the engine:
//! - Version: One immutable record, either a value or a tombstone
//! - VersionChain: Per-key append-ordered history with its own RwLock
//! - Pruning: Suffix-retention garbage collection driven by a TTL
//!
//! Chains know nothing about transactions; they order records purely by the
//! `TxId`s callers hand in. The store above this crate is responsible for
//! allocating those ids under its lock so the strictly-increasing invariant
//! holds.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod version;

pub use chain::{ChainError, VersionChain};
pub use version::{Version, VersionPayload};
