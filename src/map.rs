//! Distributed Map Module
//!
//! A key/value map shared by every process attached to the same shared store
//! under the same map name.
//!
//! # Behaviour
//! - The shared store is the only source of truth. Size, membership and bulk
//!   reads always go to it.
//! - Each process keeps a bounded local cache of keys it has read or written.
//!   Once the limit is reached new keys are no longer admitted locally, but
//!   they are still written to the shared store.
//! - Every write is broadcast on the map channel. Other processes refresh or
//!   drop their cached copy; keys they never touched are not introduced.
//! - Propagation is asynchronous and last-writer-wins: a process may briefly
//!   see an older cached value.
//! - Keys and serialized values must not contain `<>`, `><` or `~~`.
//! - Store failures surface from the operation that hit them. Nothing is
//!   retried here.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::cache::{CacheStats, LocalCache};
use crate::codec::ValueCodec;
use crate::error::{MapError, Result};
use crate::event::{ensure_valid_key, ensure_valid_value, MapEvent};
use crate::metrics::{MapMetrics, MetricsSnapshot};
use crate::store::SharedStore;
use crate::tasks::{EventPublisher, EventSubscriber};

// == Map Config ==
/// Construction parameters of a [`DistributedMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapConfig {
    /// Names both the shared hash and the notification channel
    pub name: String,
    /// Maximum number of keys held in the local cache; 0 disables it
    pub local_key_limit: usize,
}

impl MapConfig {
    pub fn new(name: impl Into<String>, local_key_limit: usize) -> Self {
        Self {
            name: name.into(),
            local_key_limit,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(MapError::InvalidConfig("map name is required".to_string()));
        }
        Ok(())
    }
}

// == Stats Snapshot ==
/// Local cache counters and event traffic of one map instance.
#[derive(Debug, Clone, Serialize)]
pub struct MapStatsSnapshot {
    pub name: String,
    pub local_key_limit: usize,
    pub cache: CacheStats,
    pub events: MetricsSnapshot,
}

// == Distributed Map ==
pub struct DistributedMap<C: ValueCodec> {
    name: String,
    local: Arc<RwLock<LocalCache<C::Value>>>,
    store: Arc<dyn SharedStore>,
    codec: Arc<C>,
    publisher: EventPublisher<C::Value>,
    subscriber: EventSubscriber,
    metrics: Arc<MapMetrics>,
    closed: AtomicBool,
}

impl<C: ValueCodec> DistributedMap<C> {
    // == Constructors ==
    /// Attaches to the map named in `config` with an empty local cache.
    ///
    /// Existing shared data for that name is kept. The channel subscription
    /// is in place before this returns, so no later write is missed.
    pub async fn connect(config: MapConfig, store: Arc<dyn SharedStore>, codec: C) -> Result<Self> {
        Self::connect_with_backing(config, HashMap::new(), store, codec).await
    }

    /// Like [`connect`](Self::connect), seeding the local cache with `backing`.
    ///
    /// Fails if `backing` holds more keys than the local key limit.
    pub async fn connect_with_backing(
        config: MapConfig,
        backing: HashMap<String, C::Value>,
        store: Arc<dyn SharedStore>,
        codec: C,
    ) -> Result<Self> {
        config.validate()?;
        let local = Arc::new(RwLock::new(LocalCache::with_backing(
            backing,
            config.local_key_limit,
        )?));
        let codec = Arc::new(codec);
        let metrics = Arc::new(MapMetrics::new());

        let subscription = store.subscribe(&config.name).await?;
        let subscriber = EventSubscriber::spawn(
            subscription,
            config.name.clone(),
            local.clone(),
            codec.clone(),
            metrics.clone(),
        );
        let publisher =
            EventPublisher::spawn(store.clone(), config.name.clone(), codec.clone(), metrics.clone());

        info!(
            "Distributed map '{}' connected (local key limit {})",
            config.name, config.local_key_limit
        );

        Ok(Self {
            name: config.name,
            local,
            store,
            codec,
            publisher,
            subscriber,
            metrics,
            closed: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(MapError::Closed(self.name.clone()));
        }
        Ok(())
    }

    fn check_key(key: &str) -> Result<()> {
        ensure_valid_key(&format!("key '{}'", key), key)
    }

    /// Serializes a value and checks it is safe to put on the wire.
    fn encode_value(&self, key: &str, value: &C::Value) -> Result<String> {
        let raw = self.codec.encode(value)?;
        ensure_valid_value(&format!("serialized value of '{}'", key), &raw)?;
        Ok(raw)
    }

    /// Drops keys whose shared write failed, so the cache never holds a
    /// value the shared store does not.
    async fn forget_local<'a>(&self, keys: impl IntoIterator<Item = &'a str>) {
        let mut local = self.local.write().await;
        for key in keys {
            local.remove(key);
        }
    }

    // == Get ==
    /// Reads the authoritative value for `key`.
    ///
    /// A found value is also offered to the local cache, subject to the
    /// admission limit.
    ///
    /// The shared read and the local insert are not one atomic step. A remote
    /// PUT for a key not cached yet that lands between them is ignored, and
    /// the older value read here stays cached until the next write to that
    /// key.
    pub async fn get(&self, key: &str) -> Result<Option<C::Value>> {
        self.ensure_open()?;
        let Some(raw) = self.store.field_get(&self.name, key).await? else {
            return Ok(None);
        };
        let value = self.codec.decode(&raw)?;
        self.local.write().await.put(key.to_string(), value.clone());
        Ok(Some(value))
    }

    // == Put ==
    /// Writes `value` locally and to the shared store, then notifies the
    /// other processes.
    ///
    /// Returns the previous *local* value, not the previous shared one.
    pub async fn put(&self, key: impl Into<String>, value: C::Value) -> Result<Option<C::Value>> {
        self.ensure_open()?;
        let key = key.into();
        Self::check_key(&key)?;
        let raw = self.encode_value(&key, &value)?;

        let previous = self.local.write().await.put(key.clone(), value.clone());
        if let Err(e) = self.store.field_set(&self.name, &key, &raw).await {
            self.forget_local([key.as_str()]).await;
            return Err(e);
        }

        self.publisher.publish(MapEvent::Put(vec![(key, value)]));
        Ok(previous)
    }

    // == Put All ==
    /// Writes a batch with one shared store round trip and one event.
    ///
    /// Entries whose value fails to serialize are skipped and logged; the
    /// rest of the batch proceeds. A key or value containing a reserved
    /// delimiter fails the whole call before anything is written. Returns the
    /// number of entries written.
    pub async fn put_all<I>(&self, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = (String, C::Value)>,
    {
        self.ensure_open()?;
        let entries: Vec<(String, C::Value)> = entries.into_iter().collect();
        for (key, _) in &entries {
            Self::check_key(key)?;
        }

        let mut accepted = Vec::with_capacity(entries.len());
        let mut encoded = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match self.codec.encode(&value) {
                Ok(raw) => {
                    ensure_valid_value(&format!("serialized value of '{}'", key), &raw)?;
                    encoded.push((key.clone(), raw));
                    accepted.push((key, value));
                }
                Err(e) => {
                    warn!("Skipping '{}' in put_all of '{}': {}", key, self.name, e);
                    self.metrics.record_skipped(1);
                }
            }
        }
        if accepted.is_empty() {
            return Ok(0);
        }

        self.local.write().await.put_all(accepted.iter().cloned());
        if let Err(e) = self.store.field_set_all(&self.name, &encoded).await {
            self.forget_local(accepted.iter().map(|(key, _)| key.as_str()))
                .await;
            return Err(e);
        }

        let written = accepted.len();
        self.publisher.publish(MapEvent::Put(accepted));
        Ok(written)
    }

    // == Remove ==
    /// Removes `key` locally and from the shared store, then notifies the
    /// other processes.
    ///
    /// Returns the previous *local* value.
    pub async fn remove(&self, key: &str) -> Result<Option<C::Value>> {
        self.ensure_open()?;
        Self::check_key(key)?;

        let previous = self.local.write().await.remove(key);
        self.store.field_delete(&self.name, key).await?;
        self.publisher.publish(MapEvent::Delete(vec![key.to_string()]));
        Ok(previous)
    }

    // == Clear ==
    /// Empties the local cache and deletes the whole shared map.
    pub async fn clear(&self) -> Result<()> {
        self.ensure_open()?;
        self.local.write().await.clear();
        self.store.delete_all(&self.name).await?;
        self.publisher.publish(MapEvent::Clear);
        Ok(())
    }

    // == Authoritative Reads ==
    /// Number of keys in the shared map.
    pub async fn size(&self) -> Result<usize> {
        self.ensure_open()?;
        self.store.field_count(&self.name).await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.size().await? == 0)
    }

    pub async fn contains_key(&self, key: &str) -> Result<bool> {
        self.ensure_open()?;
        self.store.field_exists(&self.name, key).await
    }

    pub async fn contains_value(&self, value: &C::Value) -> Result<bool>
    where
        C::Value: PartialEq,
    {
        Ok(self.values().await?.iter().any(|v| v == value))
    }

    pub async fn keys(&self) -> Result<Vec<String>> {
        self.ensure_open()?;
        Ok(self.store.all_keys(&self.name).await?.into_iter().collect())
    }

    /// All shared values; values that fail to decode are skipped.
    pub async fn values(&self) -> Result<Vec<C::Value>> {
        self.ensure_open()?;
        let raw_values = self.store.all_values(&self.name).await?;
        let mut values = Vec::with_capacity(raw_values.len());
        for raw in raw_values {
            match self.codec.decode(&raw) {
                Ok(value) => values.push(value),
                Err(e) => {
                    warn!("Skipping undecodable value in '{}': {}", self.name, e);
                    self.metrics.record_skipped(1);
                }
            }
        }
        Ok(values)
    }

    /// All shared entries; entries that fail to decode are skipped.
    pub async fn entries(&self) -> Result<HashMap<String, C::Value>> {
        self.ensure_open()?;
        let fields = self.store.all_fields(&self.name).await?;
        let mut entries = HashMap::with_capacity(fields.len());
        for (key, raw) in fields {
            match self.codec.decode(&raw) {
                Ok(value) => {
                    entries.insert(key, value);
                }
                Err(e) => {
                    warn!("Skipping undecodable entry '{}' in '{}': {}", key, self.name, e);
                    self.metrics.record_skipped(1);
                }
            }
        }
        Ok(entries)
    }

    // == Local Reads ==
    // Answered from this process's cache only, never from the shared store.

    pub async fn get_local(&self, key: &str) -> Option<C::Value> {
        self.local.read().await.get(key).cloned()
    }

    pub async fn contains_key_local(&self, key: &str) -> bool {
        self.local.read().await.contains_key(key)
    }

    pub async fn contains_value_local(&self, value: &C::Value) -> bool
    where
        C::Value: PartialEq,
    {
        self.local.read().await.contains_value(value)
    }

    pub async fn keys_local(&self) -> Vec<String> {
        self.local.read().await.keys()
    }

    pub async fn values_local(&self) -> Vec<C::Value> {
        self.local.read().await.values()
    }

    pub async fn entries_local(&self) -> HashMap<String, C::Value> {
        self.local.read().await.entries()
    }

    pub async fn size_local(&self) -> usize {
        self.local.read().await.len()
    }

    pub async fn is_empty_local(&self) -> bool {
        self.local.read().await.is_empty()
    }

    pub async fn local_key_limit(&self) -> usize {
        self.local.read().await.limit()
    }

    // == Stats ==
    pub async fn stats(&self) -> MapStatsSnapshot {
        let local = self.local.read().await;
        MapStatsSnapshot {
            name: self.name.clone(),
            local_key_limit: local.limit(),
            cache: local.stats(),
            events: self.metrics.snapshot(),
        }
    }

    // == Lifecycle ==
    /// Waits until every event produced so far has been handed to the
    /// shared store.
    pub async fn flush(&self) {
        self.publisher.flush().await;
    }

    /// Stops the background tasks.
    ///
    /// Events already queued are still published. Every later operation
    /// except the local reads fails with [`MapError::Closed`]. Calling it
    /// again is a no-op.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.subscriber.shutdown().await;
        self.publisher.shutdown().await;
        info!("Distributed map '{}' closed", self.name);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
