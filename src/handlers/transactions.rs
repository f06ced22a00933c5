//! Transactions handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;

use crate::models::{Transaction, TransactionFilter};
use crate::{AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub data: Vec<Transaction>,
}

/// List scored transactions, newest first
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<TransactionFilter>,
) -> AppResult<Json<TransactionListResponse>> {
    let limit = filter.limit.unwrap_or(100);
    let offset = filter.offset.unwrap_or(0);

    let data = Transaction::list(&state.pool, filter).await?;
    let total = Transaction::count(&state.pool).await?;

    Ok(Json(TransactionListResponse {
        total,
        limit,
        offset,
        data,
    }))
}
