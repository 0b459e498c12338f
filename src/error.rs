//! Error types for the distributed map
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Map Error Enum ==
/// Unified error type for the distributed map and its node server.
#[derive(Error, Debug)]
pub enum MapError {
    /// Construction parameters are unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A key or serialized value contains one of the wire delimiters
    #[error("Reserved delimiter {delimiter:?} found in {field}")]
    ReservedDelimiter {
        field: String,
        delimiter: &'static str,
    },

    /// Value could not be converted to or from its transport string
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Pub/sub message does not follow the event wire format
    #[error("Malformed event: {0}")]
    Decode(String),

    /// The shared store could not complete the operation
    #[error("Shared store error: {0}")]
    Transport(String),

    /// Key not found in the shared store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// The map has been closed
    #[error("Map '{0}' is closed")]
    Closed(String),
}

impl From<redis::RedisError> for MapError {
    fn from(err: redis::RedisError) -> Self {
        MapError::Transport(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for MapError {
    fn into_response(self) -> Response {
        let status = match &self {
            MapError::NotFound(_) => StatusCode::NOT_FOUND,
            MapError::ReservedDelimiter { .. }
            | MapError::Serialization(_)
            | MapError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            MapError::Transport(_) => StatusCode::BAD_GATEWAY,
            MapError::Closed(_) => StatusCode::SERVICE_UNAVAILABLE,
            MapError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the distributed map.
pub type Result<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let resp = MapError::NotFound("k".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = MapError::ReservedDelimiter {
            field: "key".to_string(),
            delimiter: "~~",
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = MapError::Transport("connection refused".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_delimiter_message() {
        let err = MapError::ReservedDelimiter {
            field: "key 'a~~b'".to_string(),
            delimiter: "~~",
        };
        assert_eq!(err.to_string(), "Reserved delimiter \"~~\" found in key 'a~~b'");
    }
}
