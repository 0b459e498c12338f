//! Cache Statistics Module
//!
//! Tracks how the local cache admits, refuses and refreshes keys.

use serde::Serialize;

// == Cache Stats ==
/// Local cache counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// New keys admitted
    pub admitted: u64,
    /// New keys refused because the cache was full
    pub refused: u64,
    /// Local writes to already admitted keys
    pub updated: u64,
    /// Keys removed by local operations
    pub removed: u64,
    /// Admitted keys overwritten by remote PUT events
    pub remote_refreshes: u64,
    /// Admitted keys dropped by remote DELETE events
    pub remote_removals: u64,
    /// Number of times the cache was emptied
    pub clears: u64,
    /// Current number of admitted keys
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Admission Rate ==
    /// Fraction of new keys that were admitted.
    ///
    /// Returns admitted / (admitted + refused), or 1.0 if no new key was offered.
    pub fn admission_rate(&self) -> f64 {
        let offered = self.admitted + self.refused;
        if offered == 0 {
            1.0
        } else {
            self.admitted as f64 / offered as f64
        }
    }

    pub fn record_admission(&mut self) {
        self.admitted += 1;
    }

    pub fn record_refusal(&mut self) {
        self.refused += 1;
    }

    pub fn record_update(&mut self) {
        self.updated += 1;
    }

    pub fn record_removal(&mut self) {
        self.removed += 1;
    }

    pub fn record_remote_refresh(&mut self) {
        self.remote_refreshes += 1;
    }

    pub fn record_remote_removal(&mut self) {
        self.remote_removals += 1;
    }

    pub fn record_clear(&mut self) {
        self.clears += 1;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
