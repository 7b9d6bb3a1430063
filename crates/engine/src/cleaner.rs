//! Version cleanup background task
//!
//! `VersionCleaner` runs in a background thread and periodically asks the
//! store to prune obsolete versions.
//!
//! # Design Notes
//!
//! - Goes through `prune_versions()`, which takes the store lock, so passes
//!   never race with commits
//! - Graceful shutdown via atomic flag
//! - Sleeps in short slices so shutdown is prompt even with long intervals

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use strand_concurrency::MemStore;
use tracing::info;

/// Background version pruning task.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use strand_concurrency::MemStore;
/// use strand_engine::VersionCleaner;
///
/// let store = MemStore::new();
/// let cleaner = VersionCleaner::new(store.clone(), Duration::from_secs(300));
/// let handle = cleaner.start();
///
/// // ... use the store ...
///
/// cleaner.shutdown();
/// handle.join().unwrap();
/// ```
pub struct VersionCleaner {
    /// The store to prune
    store: MemStore,
    /// How often to run a pruning pass
    interval: Duration,
    /// Shutdown signal
    shutdown: Arc<AtomicBool>,
}

impl VersionCleaner {
    /// Create a new cleaner for `store`, pruning every `interval`.
    pub fn new(store: MemStore, interval: Duration) -> Self {
        Self {
            store,
            interval,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the background pruning task.
    ///
    /// Returns a `JoinHandle` to wait on; the thread runs until
    /// [`shutdown`](VersionCleaner::shutdown) is called.
    pub fn start(&self) -> JoinHandle<()> {
        let store = self.store.clone();
        let shutdown = Arc::clone(&self.shutdown);
        let interval = self.interval;

        thread::spawn(move || {
            while !shutdown.load(Ordering::Relaxed) {
                // Sleep first (don't prune immediately on start), in small
                // slices so the shutdown flag is checked frequently.
                let slice = Duration::from_millis(20).min(interval);
                let mut elapsed = Duration::ZERO;
                while elapsed < interval {
                    if shutdown.load(Ordering::Relaxed) {
                        return;
                    }
                    thread::sleep(slice);
                    elapsed += slice;
                }

                let dropped = store.prune_versions();
                if dropped > 0 {
                    info!(dropped, "version cleanup pass");
                }
            }
        })
    }

    /// Signal the background thread to stop after its current pass.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}
