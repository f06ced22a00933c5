//! Historical backfill
//!
//! Scores a historical transaction dataset (CSV) through the same pipeline
//! as the online endpoint and loads the results into PostgreSQL. Writes are
//! chunked to bound transaction size; chunk boundaries do not affect
//! per-row results.
//!
//! Usage: `backfill [path/to/creditcard.csv]`

use anyhow::{Context, Result};
use fraudguard::config::Config;
use fraudguard::db;
use fraudguard::models::{NewTransaction, Transaction};
use fraudguard::scoring::{FeatureRecord, ScoringEngine};
use std::path::Path;
use tracing::{info, warn};

const BATCH_SIZE: usize = 5_000;

/// Ground-truth label column in the historical dataset; not a feature.
const LABEL_COLUMN: &str = "class";

const DEFAULT_CSV_PATH: &str = "data/raw/creditcard.csv";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backfill=info,fraudguard=info".into()),
        )
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env();

    let csv_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CSV_PATH.to_string());
    if !Path::new(&csv_path).exists() {
        anyhow::bail!("dataset not found at {}", csv_path);
    }

    let engine = ScoringEngine::from_dir(Path::new(&config.models_dir))?;
    if engine.is_fallback() {
        warn!("Model artifacts unavailable, backfilling with fallback scores");
    }

    let pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to create database pool")?;
    db::run_migrations(&pool).await?;

    info!(path = %csv_path, "Loading historical dataset");

    let file = std::fs::File::open(&csv_path)?;
    let mut rdr = csv::Reader::from_reader(file);
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_lowercase()).collect();

    let mut chunk: Vec<FeatureRecord> = Vec::with_capacity(BATCH_SIZE);
    let mut total = 0usize;
    let mut flagged = 0usize;

    for row in rdr.records() {
        let row = row?;

        let mut record = FeatureRecord::new();
        for (header, value) in headers.iter().zip(row.iter()) {
            if header == LABEL_COLUMN {
                continue;
            }
            let value: f64 = value
                .trim()
                .parse()
                .with_context(|| format!("non-numeric value in column '{}'", header))?;
            record.insert(header, value);
        }
        chunk.push(record);

        if chunk.len() >= BATCH_SIZE {
            flagged += flush(&engine, &pool, &chunk).await?;
            total += chunk.len();
            chunk.clear();
            info!(total, "Inserted batch");
        }
    }

    if !chunk.is_empty() {
        flagged += flush(&engine, &pool, &chunk).await?;
        total += chunk.len();
    }

    info!(total, flagged, "Backfill complete");
    Ok(())
}

/// Score one chunk and insert it in a single database transaction.
async fn flush(
    engine: &ScoringEngine,
    pool: &sqlx::PgPool,
    chunk: &[FeatureRecord],
) -> Result<usize> {
    let results = engine.score_table(chunk)?;

    let rows: Vec<NewTransaction> = chunk
        .iter()
        .zip(results.iter())
        .map(|(record, result)| NewTransaction::from_scored(record, result))
        .collect::<Result<_, _>>()?;

    Transaction::bulk_insert(pool, &rows).await?;
    Ok(results.iter().filter(|r| r.is_fraud).count())
}
