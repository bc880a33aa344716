//! API Handlers
//!
//! HTTP request handlers mapping each endpoint onto one cache operation.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::cache::Lru;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, HealthResponse, KeysResponse, LenResponse, ValueResponse, WriteRequest,
    WriteResponse,
};

/// Application state shared across all handlers.
///
/// The cache synchronizes itself, so it is shared through a plain Arc.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache
    pub cache: Arc<Lru<String>>,
}

impl AppState {
    /// Creates a new AppState around the given cache.
    pub fn new(cache: Lru<String>) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Applies capacity and TTL, and logs every eviction.
    pub fn from_config(config: &Config) -> Self {
        let cache = Lru::new(config.max_entries);
        cache.set_ttl(config.ttl());
        cache.set_on_evicted(|key, value: String| {
            info!(key = %key, value_len = value.len(), "Cache entry evicted");
        });
        Self::new(cache)
    }
}

/// Handler for PUT /store
///
/// Stores a key-value pair and marks it most recently used.
pub async fn store_handler(
    State(state): State<AppState>,
    Json(req): Json<WriteRequest>,
) -> Result<Json<WriteResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.cache.store(req.key.clone(), req.value);

    Ok(Json(WriteResponse::stored(req.key)))
}

/// Handler for PUT /update
///
/// Replaces the value of an existing key without changing its recency.
pub async fn update_handler(
    State(state): State<AppState>,
    Json(req): Json<WriteRequest>,
) -> Result<Json<WriteResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.cache.update(&req.key, req.value);

    Ok(Json(WriteResponse::updated(req.key)))
}

/// Handler for GET /load/:key
pub async fn load_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ValueResponse>> {
    match state.cache.load(&key) {
        Some(value) => Ok(Json(ValueResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for GET /peek/:key
///
/// Like load, but leaves the key's recency untouched.
pub async fn peek_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ValueResponse>> {
    match state.cache.peek(&key) {
        Some(value) => Ok(Json(ValueResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
///
/// Idempotent: deleting an absent key succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    state.cache.delete(&key);
    Json(DeleteResponse::new(key))
}

/// Handler for POST /evict-oldest
pub async fn evict_oldest_handler(State(state): State<AppState>) -> Json<LenResponse> {
    state.cache.remove_oldest();
    Json(LenResponse {
        len: state.cache.len(),
    })
}

/// Handler for GET /keys
pub async fn keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    Json(KeysResponse::new(state.cache.keys()))
}

/// Handler for DELETE /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<LenResponse> {
    state.cache.clear();
    Json(LenResponse {
        len: state.cache.len(),
    })
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
