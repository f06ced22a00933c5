//! Risk tier mapping and scored-result assembly

use serde::{Deserialize, Serialize};

/// Score at or above which a transaction is flagged as fraud.
///
/// Deliberately lower than the MEDIUM tier boundary: blocking is conservative,
/// tiers are descriptive. The two scales are independent.
pub const FRAUD_DECISION_THRESHOLD: f64 = 0.20;

/// Tier boundaries. Lower bound is inclusive for MEDIUM and HIGH.
pub const MEDIUM_TIER_THRESHOLD: f64 = 0.30;
pub const HIGH_TIER_THRESHOLD: f64 = 0.70;

const BLOCK_MESSAGE: &str = "Transaction flagged as likely fraud. Recommend blocking.";
const APPROVE_MESSAGE: &str = "Transaction within normal risk bounds. Approved.";

/// Discrete risk tier derived from the continuous score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Map a risk score onto a tier.
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_TIER_THRESHOLD {
            RiskTier::High
        } else if score >= MEDIUM_TIER_THRESHOLD {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        }
    }
}

/// Outcome of scoring a single transaction. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub risk_score: f64,
    pub is_fraud: bool,
    pub risk_tier: RiskTier,
    pub verdict_message: &'static str,
}

impl ScoreResult {
    /// Assemble the full result from a risk score.
    ///
    /// Used identically by the single-row and bulk paths so both produce
    /// the same row for the same score.
    pub fn from_score(risk_score: f64) -> Self {
        let is_fraud = risk_score >= FRAUD_DECISION_THRESHOLD;
        Self {
            risk_score,
            is_fraud,
            risk_tier: RiskTier::from_score(risk_score),
            verdict_message: if is_fraud { BLOCK_MESSAGE } else { APPROVE_MESSAGE },
        }
    }

    /// Signed prediction flag as persisted: -1 fraud, 1 normal.
    pub fn prediction_flag(&self) -> i16 {
        if self.is_fraud {
            -1
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries() {
        assert_eq!(RiskTier::from_score(0.0), RiskTier::Low);
        assert_eq!(RiskTier::from_score(0.2999), RiskTier::Low);
        assert_eq!(RiskTier::from_score(0.30), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(0.6999), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(0.70), RiskTier::High);
        assert_eq!(RiskTier::from_score(1.0), RiskTier::High);
    }

    #[test]
    fn fraud_decision_independent_of_tier() {
        // 0.25 is LOW by tier but still flagged for blocking
        let result = ScoreResult::from_score(0.25);
        assert!(result.is_fraud);
        assert_eq!(result.risk_tier, RiskTier::Low);

        let result = ScoreResult::from_score(0.19);
        assert!(!result.is_fraud);
        assert_eq!(result.risk_tier, RiskTier::Low);
    }

    #[test]
    fn verdict_literals_fixed_per_branch() {
        let blocked = ScoreResult::from_score(0.95);
        let approved = ScoreResult::from_score(0.05);
        assert_eq!(blocked.verdict_message, BLOCK_MESSAGE);
        assert_eq!(approved.verdict_message, APPROVE_MESSAGE);
    }

    #[test]
    fn prediction_flag_is_signed() {
        assert_eq!(ScoreResult::from_score(0.9).prediction_flag(), -1);
        assert_eq!(ScoreResult::from_score(0.1).prediction_flag(), 1);
    }

    #[test]
    fn tier_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&RiskTier::Medium).unwrap(), "\"MEDIUM\"");
        assert_eq!(RiskTier::High.as_str(), "HIGH");
    }
}
