//! Engine layer for Strand
//!
//! This crate wraps the transactional store into an embeddable surface:
//! - Database: Store plus background version cleanup, one constructor call
//! - VersionCleaner: The periodic pruning task, usable standalone with any
//!   store handle for embedders that run their own scheduler

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cleaner;
pub mod database;

pub use cleaner::VersionCleaner;
pub use database::Database;
