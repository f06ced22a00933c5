//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::models::Transaction;
use crate::{AppResult, AppState};

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    model_loaded: bool,
    scaler_loaded: bool,
    fallback_mode: bool,
    total_records: i64,
    timestamp: i64,
}

/// Liveness plus the degraded-mode indicator: artifact absence is surfaced
/// here, not as per-request errors.
pub async fn check(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let total_records = Transaction::count(&state.pool).await.unwrap_or(0);
    let fallback = state.engine.is_fallback();

    Ok(Json(HealthResponse {
        status: if fallback { "degraded" } else { "ok" },
        service: "fraudguard",
        version: env!("CARGO_PKG_VERSION"),
        model_loaded: state.engine.classifier_loaded(),
        scaler_loaded: state.engine.scaler_loaded(),
        fallback_mode: fallback,
        total_records,
        timestamp: chrono::Utc::now().timestamp(),
    }))
}
