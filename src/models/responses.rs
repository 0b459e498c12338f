//! Response DTOs for the node server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

/// Response body for GET /map/:key
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The authoritative value
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for PUT /map/:key and DELETE /map/:key
#[derive(Debug, Clone, Serialize)]
pub struct WriteResponse {
    /// Success message
    pub message: String,
    /// The key that was written or removed
    pub key: String,
    /// Value previously cached by this process, if any
    pub previous_local: Option<Value>,
}

impl WriteResponse {
    pub fn stored(key: impl Into<String>, previous_local: Option<Value>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' stored successfully", key),
            key,
            previous_local,
        }
    }

    pub fn removed(key: impl Into<String>, previous_local: Option<Value>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' removed successfully", key),
            key,
            previous_local,
        }
    }
}

/// Response body for GET /map and GET /local
#[derive(Debug, Clone, Serialize)]
pub struct EntriesResponse {
    /// Number of entries returned
    pub count: usize,
    pub entries: HashMap<String, Value>,
}

impl EntriesResponse {
    pub fn new(entries: HashMap<String, Value>) -> Self {
        Self {
            count: entries.len(),
            entries,
        }
    }
}

/// Response body for DELETE /map
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

impl ClearResponse {
    pub fn new(map: &str) -> Self {
        Self {
            message: format!("Map '{}' cleared", map),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_response_serialize() {
        let resp = GetResponse::new("test_key", json!({"n": 1}));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("test_key"));
        assert!(json.contains(r#""n":1"#));
    }

    #[test]
    fn test_write_response_serialize() {
        let resp = WriteResponse::stored("my_key", None);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("my_key"));
        assert!(json.contains("stored successfully"));
        assert!(json.contains(r#""previous_local":null"#));

        let resp = WriteResponse::removed("old_key", Some(json!("v")));
        assert!(resp.message.contains("removed"));
        assert_eq!(resp.previous_local, Some(json!("v")));
    }

    #[test]
    fn test_entries_response_count() {
        let entries = HashMap::from([("a".to_string(), json!(1)), ("b".to_string(), json!(2))]);
        let resp = EntriesResponse::new(entries);
        assert_eq!(resp.count, 2);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
