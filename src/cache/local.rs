//! Local Cache Module
//!
//! Bounded in-process mirror of the keys this process has read or written.
//!
//! The bound is an admission limit, not an eviction policy: once `limit` keys
//! are held, new keys are quietly refused while existing keys keep updating.

use std::collections::HashMap;

use crate::cache::CacheStats;
use crate::error::{MapError, Result};

// == Local Cache ==
/// Admission-bounded key/value mirror.
///
/// The local size is the backing map's length, so it always matches the
/// number of admitted keys. Callers share one instance behind a single lock,
/// which makes the admission check and the insert one step.
#[derive(Debug)]
pub struct LocalCache<V> {
    /// Admitted entries
    entries: HashMap<String, V>,
    /// Maximum number of admitted keys
    limit: usize,
    /// Admission and refresh counters
    stats: CacheStats,
}

impl<V: Clone> LocalCache<V> {
    // == Constructor ==
    /// Creates an empty cache admitting at most `limit` keys.
    ///
    /// A limit of 0 disables local caching entirely.
    pub fn new(limit: usize) -> Self {
        Self {
            entries: HashMap::new(),
            limit,
            stats: CacheStats::new(),
        }
    }

    /// Creates a cache seeded with an initial backing container.
    ///
    /// Fails when the container already holds more keys than `limit`.
    pub fn with_backing(backing: HashMap<String, V>, limit: usize) -> Result<Self> {
        if backing.len() > limit {
            return Err(MapError::InvalidConfig(format!(
                "backing container holds {} keys, above the local key limit of {}",
                backing.len(),
                limit
            )));
        }
        let mut cache = Self::new(limit);
        cache.entries = backing;
        Ok(cache)
    }

    // == Put ==
    /// Stores a value if the key is already admitted or there is room for it.
    ///
    /// Returns the previous value for an admitted key. A new key arriving
    /// while the cache is full is dropped without error.
    pub fn put(&mut self, key: String, value: V) -> Option<V> {
        if let Some(slot) = self.entries.get_mut(&key) {
            self.stats.record_update();
            return Some(std::mem::replace(slot, value));
        }

        if self.entries.len() < self.limit {
            self.entries.insert(key, value);
            self.stats.record_admission();
        } else {
            self.stats.record_refusal();
        }
        None
    }

    // == Put All ==
    /// Stores a batch of entries under the same admission rule as [`put`].
    ///
    /// When the whole batch fits in the remaining room it is admitted at
    /// once; otherwise entries are offered one by one and the overflow of
    /// new keys is dropped.
    ///
    /// [`put`]: LocalCache::put
    pub fn put_all<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, V)>,
    {
        let entries: Vec<(String, V)> = entries.into_iter().collect();
        let room = self.limit - self.entries.len();

        if entries.len() < room {
            for (key, value) in entries {
                if self.entries.insert(key, value).is_some() {
                    self.stats.record_update();
                } else {
                    self.stats.record_admission();
                }
            }
        } else {
            for (key, value) in entries {
                self.put(key, value);
            }
        }
    }

    // == Refresh ==
    /// Overwrites the value of an already admitted key.
    ///
    /// Unknown keys are ignored, so a remote update never introduces a key
    /// this process has not touched itself. Returns whether the key was
    /// refreshed.
    pub fn refresh(&mut self, key: &str, value: V) -> bool {
        match self.entries.get_mut(key) {
            Some(slot) => {
                *slot = value;
                self.stats.record_remote_refresh();
                true
            }
            None => false,
        }
    }

    // == Remove ==
    /// Removes a key, returning its value if it was admitted.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.stats.record_removal();
        }
        removed
    }

    /// Removes a key on behalf of a remote delete.
    ///
    /// Returns whether the key was present.
    pub fn invalidate(&mut self, key: &str) -> bool {
        let present = self.entries.remove(key).is_some();
        if present {
            self.stats.record_remote_removal();
        }
        present
    }

    // == Clear ==
    /// Drops every admitted entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.record_clear();
    }

    // == Read Accessors ==
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.entries.values().any(|v| v == value)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<V> {
        self.entries.values().cloned().collect()
    }

    pub fn entries(&self) -> HashMap<String, V> {
        self.entries.clone()
    }

    /// Returns the number of admitted keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the admission limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }
}
