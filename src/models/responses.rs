//! Response DTOs for the cache service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

/// Response body for GET /load/:key and GET /peek/:key
#[derive(Debug, Clone, Serialize)]
pub struct ValueResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl ValueResponse {
    /// Creates a new ValueResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for PUT /store and PUT /update
#[derive(Debug, Clone, Serialize)]
pub struct WriteResponse {
    /// Success message
    pub message: String,
    /// The key that was written
    pub key: String,
}

impl WriteResponse {
    /// Creates a response for a stored key
    pub fn stored(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' stored successfully", key),
            key,
        }
    }

    /// Creates a response for an update request.
    ///
    /// Updates of absent keys are accepted and ignored, so this does not
    /// claim the key exists.
    pub fn updated(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Update for key '{}' applied if present", key),
            key,
        }
    }
}

/// Response body for DELETE /del/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for GET /keys
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    /// Keys, most recently used first
    pub keys: Vec<String>,
    /// Number of keys
    pub len: usize,
}

impl KeysResponse {
    pub fn new(keys: Vec<String>) -> Self {
        let len = keys.len();
        Self { keys, len }
    }
}

/// Response body for POST /evict-oldest and DELETE /clear
#[derive(Debug, Clone, Serialize)]
pub struct LenResponse {
    /// Number of entries left in the cache
    pub len: usize,
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
