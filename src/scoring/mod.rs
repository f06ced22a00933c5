//! Transaction scoring pipeline
//!
//! Takes raw transaction features, produces a calibrated fraud probability,
//! and classifies it into a discrete risk tier. The same pipeline serves the
//! online prediction endpoint and the historical backfill, so both paths
//! produce identical per-row results.
//!
//! The engine is built once at startup and shared read-only for the process
//! lifetime. When model artifacts are unavailable it degrades to a crude
//! amount-proportional heuristic instead of refusing all requests.

pub mod artifacts;
pub mod error;
pub mod features;
pub mod result;

#[cfg(test)]
mod tests;

pub use artifacts::{ModelArtifacts, StandardScaler};
pub use error::ScoreError;
pub use features::FeatureRecord;
pub use result::{RiskTier, ScoreResult};

use std::path::Path;
use tracing::{info, warn};

/// Amount at which the fallback heuristic saturates.
const FALLBACK_AMOUNT_CEILING: f64 = 5000.0;

/// Scoring strategy, selected once at startup based on artifact
/// availability and never re-evaluated per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreStrategy {
    Model,
    Fallback,
}

/// Immutable scoring context: loaded artifacts plus the strategy they imply.
pub struct ScoringEngine {
    artifacts: ModelArtifacts,
    strategy: ScoreStrategy,
}

impl ScoringEngine {
    /// Build the engine from an artifacts directory.
    ///
    /// Fails only on an unresolvable declared feature order; absent
    /// artifacts select fallback mode for the whole process lifetime.
    pub fn from_dir(models_dir: &Path) -> anyhow::Result<Self> {
        let artifacts = artifacts::load(models_dir)?;

        let strategy = if artifacts.classifier.is_some() && artifacts.scaler.is_some() {
            ScoreStrategy::Model
        } else {
            warn!("Model artifacts unavailable, scoring in fallback mode");
            ScoreStrategy::Fallback
        };

        info!(strategy = ?strategy, "Scoring engine initialized");
        Ok(Self { artifacts, strategy })
    }

    pub fn strategy(&self) -> ScoreStrategy {
        self.strategy
    }

    pub fn is_fallback(&self) -> bool {
        self.strategy == ScoreStrategy::Fallback
    }

    pub fn classifier_loaded(&self) -> bool {
        self.artifacts.classifier.is_some()
    }

    pub fn scaler_loaded(&self) -> bool {
        self.artifacts.scaler.is_some()
    }

    /// Score a single transaction.
    pub fn score_one(&self, record: &FeatureRecord) -> Result<ScoreResult, ScoreError> {
        let risk_score = match self.strategy {
            ScoreStrategy::Model => self.model_score(record)?,
            ScoreStrategy::Fallback => Self::fallback_score(record)?,
        };
        Ok(ScoreResult::from_score(risk_score))
    }

    /// Score a table of transactions, index-aligned with the input.
    ///
    /// Each row depends only on itself, so per-row results match
    /// [`ScoringEngine::score_one`] exactly and callers may chunk persistence
    /// however they like.
    pub fn score_table(&self, records: &[FeatureRecord]) -> Result<Vec<ScoreResult>, ScoreError> {
        records.iter().map(|r| self.score_one(r)).collect()
    }

    fn model_score(&self, record: &FeatureRecord) -> Result<f64, ScoreError> {
        let (classifier, scaler) = match (&self.artifacts.classifier, &self.artifacts.scaler) {
            (Some(c), Some(s)) => (c, s),
            // Strategy selection guarantees both are present in model mode.
            _ => {
                return Err(ScoreError::inference(anyhow::anyhow!(
                    "model strategy selected without loaded artifacts"
                )))
            }
        };

        let vector = features::normalize(record, scaler, &self.artifacts.feature_order)?;
        let probability = classifier
            .positive_probability(&vector)
            .map_err(ScoreError::inference)?;

        Ok(probability.clamp(0.0, 1.0))
    }

    fn fallback_score(record: &FeatureRecord) -> Result<f64, ScoreError> {
        let amount = record.get(features::AMOUNT_FIELD).ok_or_else(|| {
            ScoreError::MissingFeatures(vec![features::AMOUNT_FIELD.to_string()])
        })?;
        Ok((amount / FALLBACK_AMOUNT_CEILING).clamp(0.0, 1.0))
    }
}
