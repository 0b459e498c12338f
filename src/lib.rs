//! Shared Map - a key/value map shared between processes
//!
//! Data lives in a shared store (Redis); every process keeps a bounded local
//! cache that pub/sub notifications keep close to the shared state.

pub mod api;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod map;
pub mod metrics;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use codec::{JsonCodec, ValueCodec};
pub use config::Config;
pub use error::{MapError, Result};
pub use map::{DistributedMap, MapConfig};
pub use store::{MemoryStore, RedisStore, SharedStore};
