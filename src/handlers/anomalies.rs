//! Anomalies handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;

use crate::models::{Transaction, TransactionFilter};
use crate::{AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct AnomalyListResponse {
    pub total_transactions: i64,
    pub total_anomalies: i64,
    pub percentage: String,
    pub data: Vec<Transaction>,
}

/// List flagged transactions ordered by risk score
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<TransactionFilter>,
) -> AppResult<Json<AnomalyListResponse>> {
    let data = Transaction::list_anomalies(&state.pool, filter).await?;
    let total = Transaction::count(&state.pool).await?;
    let total_anomalies = Transaction::count_anomalies(&state.pool).await?;

    let percentage = if total > 0 {
        (total_anomalies as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    Ok(Json(AnomalyListResponse {
        total_transactions: total,
        total_anomalies,
        percentage: format!("{:.2}%", percentage),
        data,
    }))
}
