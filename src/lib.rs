//! LRU Store - a fixed-capacity, thread-safe LRU cache
//!
//! Provides an in-process cache with optional TTL expiry and an eviction
//! callback, plus a small HTTP service exposing it.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use api::AppState;
pub use cache::Lru;
pub use config::Config;
