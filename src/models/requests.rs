//! Request DTOs for the node server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

/// Request body for PUT /map/:key
#[derive(Debug, Clone, Deserialize)]
pub struct PutRequest {
    /// The value to store, any JSON document
    pub value: Value,
}
