//! API Routes
//!
//! Configures the Axum router with all cache service endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, evict_oldest_handler, health_handler, keys_handler,
    load_handler, peek_handler, store_handler, update_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: One span per request, which is how call sites are correlated
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/store", put(store_handler))
        .route("/update", put(update_handler))
        .route("/load/:key", get(load_handler))
        .route("/peek/:key", get(peek_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/evict-oldest", post(evict_oldest_handler))
        .route("/keys", get(keys_handler))
        .route("/clear", delete(clear_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
