//! # mostrador-api: HTTP Back-Office API
//!
//! JSON endpoints over the mostrador-db repositories.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Request Flow                                   │
//! │                                                                         │
//! │  HTTP request                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TraceLayer (tower-http) ── request span                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  routes::* handler ── extract JSON / path / query                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  state.db.<repository>() ── one transaction per mutating call          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Json<T> on success, ApiError { code, message } on failure             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod routes;

use axum::Router;
use mostrador_db::Database;
use tower_http::trace::TraceLayer;

pub use crate::config::ApiConfig;
pub use crate::error::{ApiError, ApiResult, ErrorBody};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::sales::router())
        .merge(routes::cash_sessions::router())
        .merge(routes::payments::router())
        .merge(routes::credit_accounts::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
