//! API Module
//!
//! HTTP handlers and routing for the node server, which exposes one
//! distributed map so several processes can be observed sharing it.
//!
//! # Endpoints
//! - `PUT /map/:key`, `GET /map/:key`, `DELETE /map/:key` - Single-key operations
//! - `GET /map`, `DELETE /map` - Whole-map operations
//! - `GET /local` - Entries cached by this process
//! - `GET /stats` - Cache and event statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
