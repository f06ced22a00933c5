//! Fraudguard - Transaction Fraud Scoring Server
//!
//! Scores financial transactions for fraud risk and exposes the results
//! through a small read/write HTTP API backed by PostgreSQL.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       FRAUDGUARD                           │
//! ├────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌────────────────┐  ┌───────────────────┐  │
//! │  │  API      │  │  Scoring       │  │  Backfill         │  │
//! │  │  (Axum)   │  │  Pipeline      │  │  (bulk CSV load)  │  │
//! │  │           │  │  (ONNX + ort)  │  │                   │  │
//! │  └─────┬─────┘  └───────┬────────┘  └─────────┬─────────┘  │
//! │        └────────────────┼─────────────────────┘            │
//! │                         ▼                                  │
//! │                  ┌─────────────┐                           │
//! │                  │ PostgreSQL  │                           │
//! │                  └─────────────┘                           │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod scoring;

pub use error::{AppError, AppResult};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub config: config::Config,
    pub engine: Arc<scoring::ScoringEngine>,
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/predict", post(handlers::predict::predict))
        .route("/api/v1/transactions", get(handlers::transactions::list))
        .route("/api/v1/anomalies", get(handlers::anomalies::list))
        .route("/api/v1/kpis/global", get(handlers::kpis::global))
        .route("/api/v1/kpis/risk-distribution", get(handlers::kpis::risk_distribution))
        .route("/api/v1/kpis/daily-transactions", get(handlers::kpis::daily_transactions))
        .route("/api/v1/kpis/daily-anomalies", get(handlers::kpis::daily_anomalies))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
