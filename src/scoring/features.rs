//! Feature records and normalization
//!
//! A [`FeatureRecord`] is the raw per-transaction input: a case-insensitive
//! map of feature name to value. Normalization turns it into the exact
//! ordered column vector the classifier was fitted with: the 28 anonymized
//! components pass through unchanged, amount and time are each replaced by
//! their scaled counterparts.

use std::collections::{HashMap, HashSet};

use crate::scoring::artifacts::StandardScaler;
use crate::scoring::error::ScoreError;

pub const AMOUNT_FIELD: &str = "amount";
pub const TIME_FIELD: &str = "time";
pub const SCALED_AMOUNT: &str = "scaled_amount";
pub const SCALED_TIME: &str = "scaled_time";

/// Number of anonymized components (v1..v28).
pub const COMPONENT_COUNT: usize = 28;

/// Width of the classifier input: 28 components + scaled amount + scaled time.
pub const FEATURE_VECTOR_LEN: usize = COMPONENT_COUNT + 2;

/// Name of the i-th anonymized component, 1-based.
pub fn component_name(index: usize) -> String {
    format!("v{}", index)
}

/// Fields every raw record must carry, in schema order.
pub fn required_fields() -> Vec<String> {
    let mut fields = Vec::with_capacity(FEATURE_VECTOR_LEN);
    fields.push(AMOUNT_FIELD.to_string());
    fields.push(TIME_FIELD.to_string());
    for i in 1..=COMPONENT_COUNT {
        fields.push(component_name(i));
    }
    fields
}

/// Column order the classifier was trained with, used when no declared
/// order ships alongside the model artifacts.
pub fn canonical_feature_order() -> Vec<String> {
    let mut order = Vec::with_capacity(FEATURE_VECTOR_LEN);
    for i in 1..=COMPONENT_COUNT {
        order.push(component_name(i));
    }
    order.push(SCALED_AMOUNT.to_string());
    order.push(SCALED_TIME.to_string());
    order
}

/// Check a declared feature order against what normalization can produce.
///
/// Column-order coupling to the trained model is a hard precondition: an
/// unresolvable order is a startup failure, not something to discover at
/// first request.
pub fn validate_feature_order(order: &[String]) -> anyhow::Result<()> {
    if order.len() != FEATURE_VECTOR_LEN {
        anyhow::bail!(
            "declared feature order has {} columns, classifier input takes {}",
            order.len(),
            FEATURE_VECTOR_LEN
        );
    }

    let mut producible: HashSet<String> = (1..=COMPONENT_COUNT).map(component_name).collect();
    producible.insert(SCALED_AMOUNT.to_string());
    producible.insert(SCALED_TIME.to_string());

    let mut seen = HashSet::new();
    for name in order {
        if !producible.contains(name.as_str()) {
            anyhow::bail!("declared feature '{}' is not produced by the normalizer", name);
        }
        if !seen.insert(name.as_str()) {
            anyhow::bail!("declared feature '{}' appears more than once", name);
        }
    }
    Ok(())
}

/// Raw feature set for one transaction. Keys are folded to lowercase so
/// callers may send either case convention.
#[derive(Debug, Clone, Default)]
pub struct FeatureRecord {
    values: HashMap<String, f64>,
}

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_lowercase(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(&name.to_lowercase()).copied()
    }

    /// Required fields absent from this record, in schema order.
    pub fn missing_fields(&self) -> Vec<String> {
        required_fields()
            .into_iter()
            .filter(|f| !self.values.contains_key(f))
            .collect()
    }
}

impl From<HashMap<String, f64>> for FeatureRecord {
    fn from(map: HashMap<String, f64>) -> Self {
        let mut record = Self::new();
        for (name, value) in map {
            record.insert(&name, value);
        }
        record
    }
}

/// Produce the ordered classifier input for one record.
///
/// Rejects the record with every missing field named, not just the first.
pub fn normalize(
    record: &FeatureRecord,
    scaler: &StandardScaler,
    order: &[String],
) -> Result<Vec<f32>, ScoreError> {
    let missing = record.missing_fields();
    if !missing.is_empty() {
        return Err(ScoreError::MissingFeatures(missing));
    }

    // Presence was just checked; the or-else arms are unreachable unless the
    // declared order names a field outside the schema, which startup
    // validation already rejects.
    let mut vector = Vec::with_capacity(order.len());
    for name in order {
        let value = match name.as_str() {
            SCALED_AMOUNT => record
                .get(AMOUNT_FIELD)
                .map(|v| scaler.transform(v))
                .ok_or_else(|| ScoreError::MissingFeatures(vec![AMOUNT_FIELD.to_string()]))?,
            SCALED_TIME => record
                .get(TIME_FIELD)
                .map(|v| scaler.transform(v))
                .ok_or_else(|| ScoreError::MissingFeatures(vec![TIME_FIELD.to_string()]))?,
            other => record
                .get(other)
                .ok_or_else(|| ScoreError::MissingFeatures(vec![other.to_string()]))?,
        };
        vector.push(value as f32);
    }
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_record() -> FeatureRecord {
        let mut record = FeatureRecord::new();
        record.insert("Amount", 120.0);
        record.insert("Time", 3600.0);
        for i in 1..=COMPONENT_COUNT {
            record.insert(&format!("V{}", i), i as f64);
        }
        record
    }

    #[test]
    fn keys_are_case_insensitive() {
        let mut record = FeatureRecord::new();
        record.insert("AMOUNT", 42.0);
        record.insert("V1", -1.5);

        assert_eq!(record.get("amount"), Some(42.0));
        assert_eq!(record.get("Amount"), Some(42.0));
        assert_eq!(record.get("v1"), Some(-1.5));
    }

    #[test]
    fn missing_fields_are_all_named() {
        let mut record = FeatureRecord::new();
        record.insert("time", 10.0);
        for i in 3..=COMPONENT_COUNT {
            record.insert(&component_name(i), 0.0);
        }

        let missing = record.missing_fields();
        assert_eq!(missing, vec!["amount".to_string(), "v1".to_string(), "v2".to_string()]);
    }

    #[test]
    fn normalize_rejects_incomplete_record() {
        let record = FeatureRecord::new();
        let scaler = StandardScaler { mean: 0.0, std: 1.0 };

        let err = normalize(&record, &scaler, &canonical_feature_order()).unwrap_err();
        match err {
            ScoreError::MissingFeatures(fields) => {
                assert_eq!(fields.len(), FEATURE_VECTOR_LEN);
                assert!(fields.contains(&"amount".to_string()));
                assert!(fields.contains(&"v28".to_string()));
            }
            other => panic!("expected MissingFeatures, got {:?}", other),
        }
    }

    #[test]
    fn normalize_follows_declared_order() {
        let record = full_record();
        let scaler = StandardScaler { mean: 0.0, std: 1.0 };

        let vector = normalize(&record, &scaler, &canonical_feature_order()).unwrap();
        assert_eq!(vector.len(), FEATURE_VECTOR_LEN);
        // v1..v28 first, then scaled amount and time under an identity scaler
        assert_eq!(vector[0], 1.0);
        assert_eq!(vector[27], 28.0);
        assert_eq!(vector[28], 120.0);
        assert_eq!(vector[29], 3600.0);
    }

    #[test]
    fn normalize_scales_amount_and_time_only() {
        let record = full_record();
        let scaler = StandardScaler { mean: 100.0, std: 50.0 };

        let vector = normalize(&record, &scaler, &canonical_feature_order()).unwrap();
        assert_eq!(vector[28], ((120.0 - 100.0) / 50.0) as f32);
        assert_eq!(vector[29], ((3600.0 - 100.0) / 50.0) as f32);
        // components untouched
        assert_eq!(vector[13], 14.0);
    }

    #[test]
    fn feature_order_validation() {
        assert!(validate_feature_order(&canonical_feature_order()).is_ok());

        let short = vec!["v1".to_string()];
        assert!(validate_feature_order(&short).is_err());

        let mut unknown = canonical_feature_order();
        unknown[0] = "merchant_id".to_string();
        assert!(validate_feature_order(&unknown).is_err());

        let mut duplicated = canonical_feature_order();
        duplicated[1] = "v1".to_string();
        assert!(validate_feature_order(&duplicated).is_err());
    }
}
