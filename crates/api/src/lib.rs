//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST routes over the budget analysis engine
//! - JSON error responses

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use opexa_core::BudgetAnalysisEngine;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The budget engine. Queries take the read lock, mutations the write lock.
    pub engine: Arc<RwLock<BudgetAnalysisEngine>>,
    /// Reporting currency code.
    pub currency: Arc<str>,
}

impl AppState {
    /// Wraps `engine` for sharing across requests.
    pub fn new(engine: BudgetAnalysisEngine, currency: impl Into<Arc<str>>) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
            currency: currency.into(),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
