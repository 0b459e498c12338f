//! Shared Store Module
//!
//! The authoritative, process-external hash store every map instance reads
//! and writes, plus the pub/sub primitive used for cache notifications.
//!
//! # Backends
//! - [`MemoryStore`]: in-process, shared through an `Arc` between map instances
//! - [`RedisStore`]: Redis hashes and Redis pub/sub

mod memory;
mod remote;

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

pub use memory::MemoryStore;
pub use remote::RedisStore;

/// Stream of raw messages received on a subscribed channel.
///
/// The stream ends when the underlying connection goes away.
pub type Subscription = BoxStream<'static, String>;

// == Shared Store ==
/// Hash-shaped key/value store addressed by map name and field key.
///
/// Every operation is individually atomic per field; no multi-field
/// transaction is assumed. Failures surface as [`MapError::Transport`] and
/// are not retried here.
///
/// [`MapError::Transport`]: crate::error::MapError::Transport
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Writes one field.
    async fn field_set(&self, map: &str, key: &str, value: &str) -> Result<()>;

    /// Writes several fields in one round trip.
    async fn field_set_all(&self, map: &str, entries: &[(String, String)]) -> Result<()>;

    /// Reads one field.
    async fn field_get(&self, map: &str, key: &str) -> Result<Option<String>>;

    async fn field_exists(&self, map: &str, key: &str) -> Result<bool>;

    async fn field_delete(&self, map: &str, key: &str) -> Result<()>;

    async fn all_fields(&self, map: &str) -> Result<HashMap<String, String>>;

    async fn all_values(&self, map: &str) -> Result<Vec<String>>;

    async fn all_keys(&self, map: &str) -> Result<HashSet<String>>;

    async fn field_count(&self, map: &str) -> Result<usize>;

    /// Removes the whole hash.
    async fn delete_all(&self, map: &str) -> Result<()>;

    /// Broadcasts a message to every current subscriber of `channel`.
    async fn publish(&self, channel: &str, message: &str) -> Result<()>;

    /// Subscribes to `channel`.
    ///
    /// The subscription is active when this returns, so any message published
    /// afterwards is delivered on the returned stream.
    async fn subscribe(&self, channel: &str) -> Result<Subscription>;
}
