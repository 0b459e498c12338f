//! API Handlers
//!
//! HTTP request handlers for each node server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::codec::JsonCodec;
use crate::config::Config;
use crate::error::{MapError, Result};
use crate::map::{DistributedMap, MapConfig, MapStatsSnapshot};
use crate::models::{
    ClearResponse, EntriesResponse, GetResponse, HealthResponse, PutRequest, WriteResponse,
};
use crate::store::RedisStore;

/// Distributed map holding arbitrary JSON documents.
pub type JsonMap = DistributedMap<JsonCodec<Value>>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The map served by this node
    pub map: Arc<JsonMap>,
}

impl AppState {
    /// Creates a new AppState around an already connected map.
    pub fn new(map: JsonMap) -> Self {
        Self { map: Arc::new(map) }
    }

    /// Connects to Redis and attaches to the configured map.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = RedisStore::connect(config.redis_connection_info()).await?;
        let map = DistributedMap::connect(
            MapConfig::new(config.map_name.clone(), config.local_key_limit),
            Arc::new(store),
            JsonCodec::new(),
        )
        .await?;
        Ok(Self::new(map))
    }
}

/// Handler for PUT /map/:key
pub async fn put_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<PutRequest>,
) -> Result<Json<WriteResponse>> {
    let previous = state.map.put(key.clone(), req.value).await?;
    Ok(Json(WriteResponse::stored(key, previous)))
}

/// Handler for GET /map/:key
///
/// Always answered from the shared store.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state
        .map
        .get(&key)
        .await?
        .ok_or_else(|| MapError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /map/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<WriteResponse>> {
    let previous = state.map.remove(&key).await?;
    Ok(Json(WriteResponse::removed(key, previous)))
}

/// Handler for GET /map
pub async fn entries_handler(State(state): State<AppState>) -> Result<Json<EntriesResponse>> {
    let entries = state.map.entries().await?;
    Ok(Json(EntriesResponse::new(entries)))
}

/// Handler for DELETE /map
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    state.map.clear().await?;
    Ok(Json(ClearResponse::new(state.map.name())))
}

/// Handler for GET /local
///
/// Returns only what this process currently caches.
pub async fn local_handler(State(state): State<AppState>) -> Json<EntriesResponse> {
    Json(EntriesResponse::new(state.map.entries_local().await))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<MapStatsSnapshot> {
    Json(state.map.stats().await)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
