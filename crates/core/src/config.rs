//! Engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default retention for version records: ten minutes.
const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(600);

/// Default cadence of the background pruning pass: five minutes.
const DEFAULT_PRUNE_INTERVAL: Duration = Duration::from_secs(300);

/// Tuning knobs for a store and its background version cleaner.
///
/// `transaction_timeout` is the loose upper bound on how long any transaction
/// may remain open. Version records older than this are eligible for pruning
/// on the assumption that no still-open transaction could need to snapshot
/// them, so it must comfortably exceed the longest transaction lifetime the
/// application allows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// How long a version record is retained after creation.
    pub transaction_timeout: Duration,
    /// How often the background cleaner invokes a pruning pass.
    pub prune_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
            prune_interval: DEFAULT_PRUNE_INTERVAL,
        }
    }
}
