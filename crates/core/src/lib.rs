//! Core types for Strand
//!
//! This crate defines the foundational types used throughout the engine:
//! - TxId: Monotonic transaction identifier and logical timestamp
//! - Key / Value: Opaque byte-string identifier and payload
//! - Timestamp: Wall-clock instant used only by garbage collection
//! - Config: Retention and pruning cadence knobs
//! - Error: Unified error enum

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod timestamp;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use timestamp::Timestamp;
pub use types::{Key, TxId, Value};
