//! Scored transaction model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Row};

use crate::scoring::features::{component_name, FeatureRecord, COMPONENT_COUNT};
use crate::scoring::{ScoreError, ScoreResult};

/// One scored transaction as persisted: the 30 input features, the signed
/// prediction flag (-1 fraud, 1 normal), score, tier, and insertion time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: i64,
    pub time: f64,
    pub amount: f64,
    pub v1: f64,
    pub v2: f64,
    pub v3: f64,
    pub v4: f64,
    pub v5: f64,
    pub v6: f64,
    pub v7: f64,
    pub v8: f64,
    pub v9: f64,
    pub v10: f64,
    pub v11: f64,
    pub v12: f64,
    pub v13: f64,
    pub v14: f64,
    pub v15: f64,
    pub v16: f64,
    pub v17: f64,
    pub v18: f64,
    pub v19: f64,
    pub v20: f64,
    pub v21: f64,
    pub v22: f64,
    pub v23: f64,
    pub v24: f64,
    pub v25: f64,
    pub v26: f64,
    pub v27: f64,
    pub v28: f64,
    pub prediction: i16,
    pub risk_score: f64,
    pub risk_level: String,
    pub created_at: DateTime<Utc>,
}

/// Row ready for insertion, built from a raw record plus its score.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub time: f64,
    pub amount: f64,
    pub components: [f64; COMPONENT_COUNT],
    pub prediction: i16,
    pub risk_score: f64,
    pub risk_level: String,
}

impl NewTransaction {
    pub fn from_scored(record: &FeatureRecord, result: &ScoreResult) -> Result<Self, ScoreError> {
        let missing = record.missing_fields();
        if !missing.is_empty() {
            return Err(ScoreError::MissingFeatures(missing));
        }

        let mut components = [0.0; COMPONENT_COUNT];
        for (i, slot) in components.iter_mut().enumerate() {
            // missing_fields() was empty, so every component resolves
            *slot = record.get(&component_name(i + 1)).unwrap_or_default();
        }

        Ok(Self {
            time: record.get("time").unwrap_or_default(),
            amount: record.get("amount").unwrap_or_default(),
            components,
            prediction: result.prediction_flag(),
            risk_score: result.risk_score,
            risk_level: result.risk_tier.as_str().to_string(),
        })
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct TransactionFilter {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const INSERT_SQL: &str = r#"
INSERT INTO transactions (
    time, amount,
    v1, v2, v3, v4, v5, v6, v7, v8, v9, v10,
    v11, v12, v13, v14, v15, v16, v17, v18, v19, v20,
    v21, v22, v23, v24, v25, v26, v27, v28,
    prediction, risk_score, risk_level
)
VALUES (
    $1, $2,
    $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
    $13, $14, $15, $16, $17, $18, $19, $20, $21, $22,
    $23, $24, $25, $26, $27, $28, $29, $30,
    $31, $32, $33
)
"#;

fn bind_new<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    row: &'q NewTransaction,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    let mut query = query.bind(row.time).bind(row.amount);
    for value in row.components {
        query = query.bind(value);
    }
    query
        .bind(row.prediction)
        .bind(row.risk_score)
        .bind(&row.risk_level)
}

impl Transaction {
    pub async fn create(pool: &PgPool, row: &NewTransaction) -> Result<Self, sqlx::Error> {
        let sql = format!("{} RETURNING *", INSERT_SQL);
        let inserted = bind_new(sqlx::query(&sql), row).fetch_one(pool).await?;
        Transaction::from_row(&inserted)
    }

    /// Insert a chunk of scored rows in a single database transaction.
    /// Callers bound chunk size; each row is independent.
    pub async fn bulk_insert(pool: &PgPool, rows: &[NewTransaction]) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        for row in rows {
            bind_new(sqlx::query(INSERT_SQL), row).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn list(pool: &PgPool, filter: TransactionFilter) -> Result<Vec<Self>, sqlx::Error> {
        let limit = filter.limit.unwrap_or(100);
        let offset = filter.offset.unwrap_or(0);

        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Flagged transactions, riskiest first.
    pub async fn list_anomalies(
        pool: &PgPool,
        filter: TransactionFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let limit = filter.limit.unwrap_or(100);
        let offset = filter.offset.unwrap_or(0);

        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE prediction = -1
            ORDER BY risk_score DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM transactions")
            .fetch_one(pool)
            .await?;
        Ok(row.get("count"))
    }

    pub async fn count_anomalies(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM transactions WHERE prediction = -1")
            .fetch_one(pool)
            .await?;
        Ok(row.get("count"))
    }

    pub async fn risk_distribution(pool: &PgPool) -> Result<Vec<(String, i64)>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT risk_level, COUNT(*) as count
            FROM transactions
            GROUP BY risk_level
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.get::<String, _>("risk_level"), r.get::<i64, _>("count")))
            .collect())
    }

    /// Daily row counts for the dashboard, newest day first.
    pub async fn daily_counts(
        pool: &PgPool,
        anomalies_only: bool,
        limit: i64,
    ) -> Result<Vec<(NaiveDate, i64)>, sqlx::Error> {
        let sql = if anomalies_only {
            r#"
            SELECT created_at::date AS day, COUNT(*) as count
            FROM transactions
            WHERE prediction = -1
            GROUP BY day
            ORDER BY day DESC
            LIMIT $1
            "#
        } else {
            r#"
            SELECT created_at::date AS day, COUNT(*) as count
            FROM transactions
            GROUP BY day
            ORDER BY day DESC
            LIMIT $1
            "#
        };

        let rows = sqlx::query(sql).bind(limit).fetch_all(pool).await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.get::<NaiveDate, _>("day"), r.get::<i64, _>("count")))
            .collect())
    }
}
