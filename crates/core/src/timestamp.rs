//! Microsecond-precision timestamp type
//!
//! Version records carry a wall-clock timestamp recording when they were
//! appended. The timestamp participates only in garbage collection; logical
//! ordering always comes from `TxId`, never from real time.
//!
//! Timestamps are stored as microseconds since Unix epoch. Raw arithmetic is
//! not exposed; pruning only ever asks "how long ago", via the saturating
//! elapsed-time helper.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Microsecond-precision wall-clock timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a timestamp for the current moment.
    ///
    /// Uses system time. Returns the epoch if the system clock reads before
    /// Unix epoch (e.g. after an NTP step backwards).
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(duration.as_micros() as u64)
    }

    /// Create a timestamp from microseconds since epoch.
    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Timestamp(micros)
    }

    /// Elapsed time since `earlier`, or zero when `earlier` is in the future.
    pub fn saturating_duration_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}
