//! In-process shared store.
//!
//! Several map instances holding the same `Arc<MemoryStore>` behave like
//! separate processes attached to one Redis server.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

use super::{SharedStore, Subscription};
use crate::error::{MapError, Result};

/// Buffered messages per channel before slow subscribers start lagging
const CHANNEL_CAPACITY: usize = 1024;

// == Memory Store ==
#[derive(Debug)]
pub struct MemoryStore {
    /// Hashes by map name
    hashes: RwLock<HashMap<String, HashMap<String, String>>>,
    /// Pub/sub channels by name
    channels: Mutex<HashMap<String, broadcast::Sender<String>>>,
    /// When set, every operation fails as if the server were unreachable
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            hashes: RwLock::new(HashMap::new()),
            channels: Mutex::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Simulates losing (or regaining) the connection to the store.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(MapError::Transport("memory store unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn field_set(&self, map: &str, key: &str, value: &str) -> Result<()> {
        self.check_available()?;
        let mut hashes = self.hashes.write().await;
        hashes
            .entry(map.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn field_set_all(&self, map: &str, entries: &[(String, String)]) -> Result<()> {
        self.check_available()?;
        if entries.is_empty() {
            return Ok(());
        }
        let mut hashes = self.hashes.write().await;
        let hash = hashes.entry(map.to_string()).or_default();
        for (key, value) in entries {
            hash.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn field_get(&self, map: &str, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        let hashes = self.hashes.read().await;
        Ok(hashes.get(map).and_then(|hash| hash.get(key)).cloned())
    }

    async fn field_exists(&self, map: &str, key: &str) -> Result<bool> {
        self.check_available()?;
        let hashes = self.hashes.read().await;
        Ok(hashes.get(map).is_some_and(|hash| hash.contains_key(key)))
    }

    async fn field_delete(&self, map: &str, key: &str) -> Result<()> {
        self.check_available()?;
        let mut hashes = self.hashes.write().await;
        if let Some(hash) = hashes.get_mut(map) {
            hash.remove(key);
            // Redis drops a hash once its last field is gone
            if hash.is_empty() {
                hashes.remove(map);
            }
        }
        Ok(())
    }

    async fn all_fields(&self, map: &str) -> Result<HashMap<String, String>> {
        self.check_available()?;
        let hashes = self.hashes.read().await;
        Ok(hashes.get(map).cloned().unwrap_or_default())
    }

    async fn all_values(&self, map: &str) -> Result<Vec<String>> {
        self.check_available()?;
        let hashes = self.hashes.read().await;
        Ok(hashes
            .get(map)
            .map(|hash| hash.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn all_keys(&self, map: &str) -> Result<HashSet<String>> {
        self.check_available()?;
        let hashes = self.hashes.read().await;
        Ok(hashes
            .get(map)
            .map(|hash| hash.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn field_count(&self, map: &str) -> Result<usize> {
        self.check_available()?;
        let hashes = self.hashes.read().await;
        Ok(hashes.get(map).map_or(0, |hash| hash.len()))
    }

    async fn delete_all(&self, map: &str) -> Result<()> {
        self.check_available()?;
        self.hashes.write().await.remove(map);
        Ok(())
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<()> {
        self.check_available()?;
        let channels = self.channels.lock().await;
        if let Some(sender) = channels.get(channel) {
            // no receivers left is not an error for pub/sub
            let _ = sender.send(message.to_string());
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription> {
        self.check_available()?;
        let receiver = {
            let mut channels = self.channels.lock().await;
            channels
                .entry(channel.to_string())
                .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
                .subscribe()
        };

        let channel = channel.to_string();
        let messages = stream::unfold(receiver, move |mut receiver| {
            let channel = channel.clone();
            async move {
                loop {
                    match receiver.recv().await {
                        Ok(message) => return Some((message, receiver)),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(channel = %channel, skipped, "Subscriber lagged, messages lost");
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            }
        });

        Ok(messages.boxed())
    }
}
