//! API Module
//!
//! HTTP handlers and routing for the cache service REST API.
//!
//! # Endpoints
//! - `PUT /store` - Store a key-value pair (marks it most recently used)
//! - `PUT /update` - Replace a value without changing recency
//! - `GET /load/:key` - Retrieve a value (marks it most recently used)
//! - `GET /peek/:key` - Retrieve a value without changing recency
//! - `DELETE /del/:key` - Delete a key
//! - `POST /evict-oldest` - Evict the least recently used entry
//! - `GET /keys` - List keys, most recently used first
//! - `DELETE /clear` - Drop every entry
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
