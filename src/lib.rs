//! # StrandDB
//!
//! An in-memory transactional key-value engine with multi-version
//! concurrency control.
//!
//! Direct `set`/`get`/`delete` calls each act as their own committed
//! transaction. Explicit transactions stage a batch of writes and commit
//! atomically under an optimistic first-committer-wins rule, reading from a
//! repeatable-read snapshot fixed when the transaction opened. A background
//! cleaner prunes version history older than the configured retention
//! window.
//!
//! # Quick Start
//!
//! ```
//! use stranddb::{Database, Value};
//!
//! let db = Database::new();
//!
//! // Direct writes are immediately visible.
//! db.set("user:name", "Alice");
//! assert_eq!(db.get("user:name"), Some(Value::from("Alice")));
//!
//! // Transactions stage writes and see a fixed snapshot.
//! let tx = db.begin();
//! tx.set("user:name", "Bob").unwrap();
//! assert_eq!(db.get("user:name"), Some(Value::from("Alice")));
//! tx.commit().unwrap();
//! assert_eq!(db.get("user:name"), Some(Value::from("Bob")));
//! ```
//!
//! # Concurrency Model
//!
//! Commits are serialised by a coarse store lock; snapshot reads take only
//! the per-key chain lock, so readers on distinct keys never contend. A
//! commit that loses a race returns a conflict error and leaves the
//! transaction open with its staged writes intact for retry.
//!
//! # What This Is Not
//!
//! There is no durability (no log, no disk), no distribution, and no
//! isolation stronger than repeatable read. Values are opaque bytes.
//!
//! Internal crates (core, storage, concurrency, engine) back this facade;
//! the re-exports here are the stable surface.

pub use strand_concurrency::{MemStore, StoreStats, Transaction};
pub use strand_core::{Config, Error, Key, Result, TxId, Value};
pub use strand_engine::{Database, VersionCleaner};
