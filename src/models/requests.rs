//! Request DTOs for the cache service API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

/// Request body for PUT /store and PUT /update
///
/// # Fields
/// - `key`: The cache key
/// - `value`: The value to write
#[derive(Debug, Clone, Deserialize)]
pub struct WriteRequest {
    /// The cache key
    pub key: String,
    /// The value to write
    pub value: String,
}

impl WriteRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            ));
        }
        if self.value.len() > MAX_VALUE_SIZE {
            return Some(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            ));
        }
        None
    }
}
