//! Scoring error taxonomy

use thiserror::Error;

/// Request-scoped scoring failures.
///
/// `MissingFeatures` is a caller error and lists every absent field, not just
/// the first. `Inference` is an internal failure and keeps the original cause
/// for logging; it never stands in for a fabricated score.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("missing required features: {}", .0.join(", "))]
    MissingFeatures(Vec<String>),

    #[error("classifier inference failed")]
    Inference(#[source] anyhow::Error),
}

impl ScoreError {
    pub fn inference(err: impl Into<anyhow::Error>) -> Self {
        Self::Inference(err.into())
    }
}
