//! Dashboard KPI handlers

use axum::{extract::State, Json};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::Transaction;
use crate::{AppResult, AppState};

const DAILY_WINDOW: i64 = 30;

#[derive(Debug, Serialize)]
pub struct GlobalKpisResponse {
    pub total_transactions: i64,
    pub total_anomalies: i64,
    pub anomaly_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct RiskDistributionResponse {
    pub distribution: HashMap<String, i64>,
}

#[derive(Debug, Serialize)]
pub struct DailyMetric {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct DailyMetricsResponse {
    pub data: Vec<DailyMetric>,
}

/// Global totals and anomaly rate (percent, 2 decimals)
pub async fn global(State(state): State<AppState>) -> AppResult<Json<GlobalKpisResponse>> {
    let total = Transaction::count(&state.pool).await?;
    let anomalies = Transaction::count_anomalies(&state.pool).await?;

    let anomaly_rate = if total > 0 {
        ((anomalies as f64 / total as f64) * 10000.0).round() / 100.0
    } else {
        0.0
    };

    Ok(Json(GlobalKpisResponse {
        total_transactions: total,
        total_anomalies: anomalies,
        anomaly_rate,
    }))
}

/// Transaction counts per risk tier
pub async fn risk_distribution(
    State(state): State<AppState>,
) -> AppResult<Json<RiskDistributionResponse>> {
    let counts = Transaction::risk_distribution(&state.pool).await?;

    Ok(Json(RiskDistributionResponse {
        distribution: counts.into_iter().collect(),
    }))
}

/// Daily transaction volume (line chart)
pub async fn daily_transactions(
    State(state): State<AppState>,
) -> AppResult<Json<DailyMetricsResponse>> {
    let rows = Transaction::daily_counts(&state.pool, false, DAILY_WINDOW).await?;
    Ok(Json(to_daily_response(rows)))
}

/// Daily anomaly volume
pub async fn daily_anomalies(
    State(state): State<AppState>,
) -> AppResult<Json<DailyMetricsResponse>> {
    let rows = Transaction::daily_counts(&state.pool, true, DAILY_WINDOW).await?;
    Ok(Json(to_daily_response(rows)))
}

fn to_daily_response(rows: Vec<(chrono::NaiveDate, i64)>) -> DailyMetricsResponse {
    DailyMetricsResponse {
        data: rows
            .into_iter()
            .map(|(date, count)| DailyMetric {
                date: date.to_string(),
                count,
            })
            .collect(),
    }
}
