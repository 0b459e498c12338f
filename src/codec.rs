//! Value Codec Module
//!
//! Converts map values to and from the strings stored in the shared store
//! and carried inside events.

use std::fmt;
use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{MapError, Result};

// == Value Codec ==
/// Serializes a typed value to a transport string and back.
///
/// Implementations must be deterministic enough that two processes sharing a
/// map decode each other's strings to equal values.
pub trait ValueCodec: Send + Sync + 'static {
    /// The application value carried by the map
    type Value: Clone + Send + Sync + 'static;

    /// Encodes a value into its transport string.
    fn encode(&self, value: &Self::Value) -> Result<String>;

    /// Decodes a transport string back into a value.
    fn decode(&self, raw: &str) -> Result<Self::Value>;
}

// == JSON Codec ==
/// Stores values as JSON text, which keeps them readable directly in Redis.
pub struct JsonCodec<V> {
    _marker: PhantomData<fn() -> V>,
}

impl<V> JsonCodec<V> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<V> Default for JsonCodec<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for JsonCodec<V> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for JsonCodec<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonCodec")
    }
}

impl<V> ValueCodec for JsonCodec<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Value = V;

    fn encode(&self, value: &V) -> Result<String> {
        serde_json::to_string(value).map_err(|e| MapError::Serialization(e.to_string()))
    }

    fn decode(&self, raw: &str) -> Result<V> {
        serde_json::from_str(raw).map_err(|e| MapError::Serialization(e.to_string()))
    }
}
