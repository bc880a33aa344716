//! Cache Module
//!
//! Provides a thread-safe LRU cache with lazy TTL expiry and eviction callbacks.

mod recency;
mod record;
mod store;


// Re-export public types
pub use recency::{Position, RecencyList};
pub use record::{expiry_from_ttl, Record};
pub use store::{Lru, OnEvicted};
