//! Prediction handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{NewTransaction, Transaction};
use crate::scoring::{FeatureRecord, ScoreResult};
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// The 30 transaction features (time, amount, v1..v28), either case
    pub features: HashMap<String, f64>,
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub is_fraud: bool,
    pub probability: f64,
    pub risk_level: &'static str,
    pub message: &'static str,
}

impl From<&ScoreResult> for PredictionResponse {
    fn from(result: &ScoreResult) -> Self {
        Self {
            is_fraud: result.is_fraud,
            probability: result.risk_score,
            risk_level: result.risk_tier.as_str(),
            message: result.verdict_message,
        }
    }
}

/// Score one transaction and persist the result.
///
/// Fallback mode means the classifier is missing; the endpoint reports
/// service-unavailable rather than serving heuristic scores online.
pub async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> AppResult<Json<PredictionResponse>> {
    if state.engine.is_fallback() {
        return Err(AppError::ModelUnavailable);
    }

    let record = FeatureRecord::from(req.features);
    let result = state.engine.score_one(&record)?;

    let row = NewTransaction::from_scored(&record, &result)?;
    Transaction::create(&state.pool, &row).await?;

    Ok(Json(PredictionResponse::from(&result)))
}
