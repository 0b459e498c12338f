//! Redis-backed shared store.
//!
//! Map contents live in one Redis hash named after the map; notifications use
//! Redis pub/sub on a channel with the same name. Commands go through one
//! multiplexed connection, and each subscription opens its own connection.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, IntoConnectionInfo};
use tracing::{info, warn};

use super::{SharedStore, Subscription};
use crate::error::Result;

// == Redis Store ==
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Connects to the Redis server described by `target`, either a
    /// [`redis::ConnectionInfo`] or a URL such as `redis://host:6379/`.
    pub async fn connect(target: impl IntoConnectionInfo) -> Result<Self> {
        let info = target.into_connection_info()?;
        let addr = info.addr.to_string();
        let client = redis::Client::open(info)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Connected to Redis at {}", addr);
        Ok(Self { client, conn })
    }

    fn conn(&self) -> MultiplexedConnection {
        self.conn.clone()
    }
}

#[async_trait]
impl SharedStore for RedisStore {
    async fn field_set(&self, map: &str, key: &str, value: &str) -> Result<()> {
        let _: () = self.conn().hset(map, key, value).await?;
        Ok(())
    }

    async fn field_set_all(&self, map: &str, entries: &[(String, String)]) -> Result<()> {
        // HSET with no field/value pairs is a syntax error in Redis
        if entries.is_empty() {
            return Ok(());
        }
        let _: () = self.conn().hset_multiple(map, entries).await?;
        Ok(())
    }

    async fn field_get(&self, map: &str, key: &str) -> Result<Option<String>> {
        Ok(self.conn().hget(map, key).await?)
    }

    async fn field_exists(&self, map: &str, key: &str) -> Result<bool> {
        Ok(self.conn().hexists(map, key).await?)
    }

    async fn field_delete(&self, map: &str, key: &str) -> Result<()> {
        let _: () = self.conn().hdel(map, key).await?;
        Ok(())
    }

    async fn all_fields(&self, map: &str) -> Result<HashMap<String, String>> {
        Ok(self.conn().hgetall(map).await?)
    }

    async fn all_values(&self, map: &str) -> Result<Vec<String>> {
        Ok(self.conn().hvals(map).await?)
    }

    async fn all_keys(&self, map: &str) -> Result<HashSet<String>> {
        Ok(self.conn().hkeys(map).await?)
    }

    async fn field_count(&self, map: &str) -> Result<usize> {
        Ok(self.conn().hlen(map).await?)
    }

    async fn delete_all(&self, map: &str) -> Result<()> {
        let _: () = self.conn().del(map).await?;
        Ok(())
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<()> {
        let _: () = self.conn().publish(channel, message).await?;
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(channel).await?;
        info!("Subscribed to Redis channel '{}'", channel);

        let messages = pubsub.into_on_message().filter_map(|msg| async move {
            match msg.get_payload::<String>() {
                Ok(payload) => Some(payload),
                Err(e) => {
                    warn!("Ignoring non-text message on '{}': {}", msg.get_channel_name(), e);
                    None
                }
            }
        });

        Ok(messages.boxed())
    }
}
