use super::features::{component_name, FeatureRecord, COMPONENT_COUNT};
use super::result::RiskTier;
use super::{ScoreError, ScoreStrategy, ScoringEngine};
use tempfile::tempdir;

fn fallback_engine() -> ScoringEngine {
    let dir = tempdir().unwrap();
    ScoringEngine::from_dir(dir.path()).unwrap()
}

fn record_with_amount(amount: f64) -> FeatureRecord {
    let mut record = FeatureRecord::new();
    record.insert("amount", amount);
    record.insert("time", 0.0);
    for i in 1..=COMPONENT_COUNT {
        record.insert(&component_name(i), 0.0);
    }
    record
}

#[test]
fn empty_artifacts_dir_selects_fallback() {
    let engine = fallback_engine();
    assert_eq!(engine.strategy(), ScoreStrategy::Fallback);
    assert!(engine.is_fallback());
    assert!(!engine.classifier_loaded());
    assert!(!engine.scaler_loaded());
}

#[test]
fn scaler_alone_is_not_enough_for_model_mode() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join(super::artifacts::SCALER_FILE),
        r#"{"mean": 0.0, "std": 1.0}"#,
    )
    .unwrap();

    let engine = ScoringEngine::from_dir(dir.path()).unwrap();
    assert!(engine.is_fallback());
    assert!(engine.scaler_loaded());
    assert!(!engine.classifier_loaded());
}

#[test]
fn fallback_is_amount_proportional_and_clamped() {
    let engine = fallback_engine();

    let cases = [
        (0.0, 0.0),
        (2500.0, 0.5),
        (5000.0, 1.0),
        (10000.0, 1.0),
        (-50.0, 0.0),
    ];
    for (amount, expected) in cases {
        let result = engine.score_one(&record_with_amount(amount)).unwrap();
        assert_eq!(result.risk_score, expected, "amount {}", amount);
        assert!((0.0..=1.0).contains(&result.risk_score));
    }
}

#[test]
fn fallback_tier_and_decision_at_3500() {
    let engine = fallback_engine();
    let result = engine.score_one(&record_with_amount(3500.0)).unwrap();

    assert_eq!(result.risk_score, 0.70);
    assert_eq!(result.risk_tier, RiskTier::High);
    assert!(result.is_fraud);
    assert_eq!(result.prediction_flag(), -1);
}

#[test]
fn fallback_requires_amount() {
    let engine = fallback_engine();
    let mut record = FeatureRecord::new();
    record.insert("time", 12.0);

    let err = engine.score_one(&record).unwrap_err();
    match err {
        ScoreError::MissingFeatures(fields) => assert_eq!(fields, vec!["amount".to_string()]),
        other => panic!("expected MissingFeatures, got {:?}", other),
    }
}

#[test]
fn table_matches_row_by_row_scoring() {
    let engine = fallback_engine();
    let records: Vec<FeatureRecord> = [0.0, 12.5, 999.0, 3500.0, 5000.0, 80000.0]
        .iter()
        .map(|&a| record_with_amount(a))
        .collect();

    let table = engine.score_table(&records).unwrap();
    assert_eq!(table.len(), records.len());

    for (i, record) in records.iter().enumerate() {
        let single = engine.score_one(record).unwrap();
        assert_eq!(table[i], single, "row {}", i);
    }
}

#[test]
fn scoring_is_idempotent() {
    let engine = fallback_engine();
    let record = record_with_amount(1234.56);

    let first = engine.score_one(&record).unwrap();
    let second = engine.score_one(&record).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.risk_score.to_bits(), second.risk_score.to_bits());
}

#[test]
fn empty_table_scores_to_empty() {
    let engine = fallback_engine();
    let table = engine.score_table(&[]).unwrap();
    assert!(table.is_empty());
}
