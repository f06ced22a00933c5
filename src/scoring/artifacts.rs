//! Model artifact loading
//!
//! Two immutable artifacts ship with the service: the fitted classifier
//! (ONNX) and the fitted amount/time scaler (JSON parameters exported from
//! training). Either may be absent; the engine then runs in fallback mode
//! for the whole process lifetime. A declared feature order that cannot be
//! resolved is a startup failure.

use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use parking_lot::RwLock;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use crate::scoring::features;

pub const CLASSIFIER_FILE: &str = "random_forest_v1.onnx";
pub const SCALER_FILE: &str = "scaler_v1.json";
pub const FEATURE_ORDER_FILE: &str = "feature_order_v1.json";

/// Fitted standard-scaler parameters. Transform is `(x - mean) / std`.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    pub mean: f64,
    pub std: f64,
}

impl StandardScaler {
    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.std.max(1e-12)
    }
}

/// Loaded classifier: ONNX session plus the input/output names discovered
/// from the graph. `Session::run` needs exclusive access, hence the lock.
pub struct Classifier {
    session: RwLock<Session>,
    input_name: String,
    output_name: String,
}

impl Classifier {
    fn load(path: &Path) -> Result<Self> {
        ort::init().commit()?;

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(1)?
            .commit_from_file(path)
            .context(format!("Failed to load classifier from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob") || o.name.contains("output"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        info!(
            path = %path.display(),
            input = %input_name,
            output = %output_name,
            "Classifier loaded"
        );

        Ok(Self {
            session: RwLock::new(session),
            input_name,
            output_name,
        })
    }

    /// Run the classifier on one normalized row and return the probability
    /// of the positive (fraud) class.
    pub fn positive_probability(&self, features: &[f32]) -> Result<f64> {
        let shape = vec![1_i64, features.len() as i64];
        let input = Tensor::from_array((shape, features.to_vec()))
            .context("Failed to build classifier input tensor")?;

        let mut session = self.session.write();
        let outputs = session.run(ort::inputs![&self.input_name => input])?;

        extract_positive_probability(&outputs, &self.output_name)
    }
}

/// Pull the positive-class probability out of the classifier response.
///
/// Tree ensembles exported from sklearn come in two shapes: a plain
/// `[batch, n_classes]` tensor, or (with the default zipmap) a
/// `seq(map(int64, float))`. Handles both; anything else is an error rather
/// than a fabricated score.
fn extract_positive_probability(outputs: &SessionOutputs, output_name: &str) -> Result<f64> {
    if let Some(output) = outputs.get(output_name) {
        if let Some(prob) = tensor_probability(output) {
            return Ok(prob);
        }
        if let Ok(prob) = zipmap_probability(output) {
            return Ok(prob);
        }
    }

    // The graph may name its outputs differently than the metadata suggested.
    for (name, output) in outputs.iter() {
        if name.contains("label") {
            continue;
        }
        if let Some(prob) = tensor_probability(&output) {
            return Ok(prob);
        }
        if let Ok(prob) = zipmap_probability(&output) {
            return Ok(prob);
        }
    }

    anyhow::bail!("classifier response carried no probability output")
}

fn tensor_probability(output: &DynValue) -> Option<f64> {
    let (shape, data) = output.try_extract_tensor::<f32>().ok()?;
    let dims: Vec<i64> = shape.iter().copied().collect();

    let n_classes = match dims.as_slice() {
        [_, n] => *n as usize,
        [n] => *n as usize,
        _ => return None,
    };

    if n_classes >= 2 {
        data.get(1).map(|&p| p as f64)
    } else {
        data.first().map(|&p| p as f64)
    }
}

fn zipmap_probability(output: &DynValue) -> Result<f64> {
    if !DynSequenceValueType::can_downcast(&output.dtype()) {
        anyhow::bail!("output is not a sequence");
    }

    let allocator = Allocator::default();
    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow::anyhow!("failed to downcast zipmap output: {}", e))?;
    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

    let first = maps
        .first()
        .ok_or_else(|| anyhow::anyhow!("empty zipmap sequence"))?;
    let pairs = first.try_extract_key_values::<i64, f32>()?;

    for (class, prob) in &pairs {
        if *class == 1 {
            return Ok(*prob as f64);
        }
    }
    for (class, prob) in &pairs {
        if *class == 0 {
            return Ok(1.0 - *prob as f64);
        }
    }

    anyhow::bail!("zipmap output carried no class probabilities")
}

/// The artifact set shared read-only by every scoring call.
pub struct ModelArtifacts {
    pub classifier: Option<Classifier>,
    pub scaler: Option<StandardScaler>,
    pub feature_order: Vec<String>,
}

/// Load artifacts from `models_dir`.
///
/// Missing or unreadable classifier/scaler files degrade to fallback mode
/// with a warning. A declared feature order the normalizer cannot satisfy
/// fails loudly.
pub fn load(models_dir: &Path) -> Result<ModelArtifacts> {
    let feature_order = load_feature_order(models_dir)?;

    let classifier_path = models_dir.join(CLASSIFIER_FILE);
    let classifier = if classifier_path.exists() {
        match Classifier::load(&classifier_path) {
            Ok(c) => Some(c),
            Err(e) => {
                warn!(error = %e, path = %classifier_path.display(), "Failed to load classifier, continuing without");
                None
            }
        }
    } else {
        warn!(path = %classifier_path.display(), "Classifier not found");
        None
    };

    let scaler_path = models_dir.join(SCALER_FILE);
    let scaler = if scaler_path.exists() {
        match read_scaler(&scaler_path) {
            Ok(s) => {
                info!(path = %scaler_path.display(), mean = s.mean, std = s.std, "Scaler loaded");
                Some(s)
            }
            Err(e) => {
                warn!(error = %e, path = %scaler_path.display(), "Failed to load scaler, continuing without");
                None
            }
        }
    } else {
        warn!(path = %scaler_path.display(), "Scaler not found");
        None
    };

    Ok(ModelArtifacts {
        classifier,
        scaler,
        feature_order,
    })
}

fn load_feature_order(models_dir: &Path) -> Result<Vec<String>> {
    let path = models_dir.join(FEATURE_ORDER_FILE);
    let order = if path.exists() {
        let raw = std::fs::read_to_string(&path)
            .context(format!("Failed to read feature order from {:?}", path))?;
        let names: Vec<String> =
            serde_json::from_str(&raw).context(format!("Invalid feature order in {:?}", path))?;
        names.into_iter().map(|n| n.to_lowercase()).collect()
    } else {
        features::canonical_feature_order()
    };

    features::validate_feature_order(&order)?;
    Ok(order)
}

fn read_scaler(path: &Path) -> Result<StandardScaler> {
    let raw = std::fs::read_to_string(path)?;
    let scaler: StandardScaler = serde_json::from_str(&raw)?;
    Ok(scaler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_dir_loads_nothing_but_succeeds() {
        let dir = tempdir().unwrap();
        let artifacts = load(dir.path()).unwrap();

        assert!(artifacts.classifier.is_none());
        assert!(artifacts.scaler.is_none());
        assert_eq!(artifacts.feature_order, features::canonical_feature_order());
    }

    #[test]
    fn scaler_params_are_read_from_json() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(SCALER_FILE), r#"{"mean": 88.3, "std": 250.1}"#).unwrap();

        let artifacts = load(dir.path()).unwrap();
        let scaler = artifacts.scaler.expect("scaler should load");
        assert_eq!(scaler.mean, 88.3);
        assert_eq!(scaler.std, 250.1);
    }

    #[test]
    fn corrupt_scaler_degrades_instead_of_failing() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(SCALER_FILE), "not json").unwrap();

        let artifacts = load(dir.path()).unwrap();
        assert!(artifacts.scaler.is_none());
    }

    #[test]
    fn unresolvable_feature_order_fails_startup() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(FEATURE_ORDER_FILE),
            r#"["merchant_id", "v2"]"#,
        )
        .unwrap();

        assert!(load(dir.path()).is_err());
    }

    #[test]
    fn declared_order_is_case_folded() {
        let dir = tempdir().unwrap();
        let upper: Vec<String> = features::canonical_feature_order()
            .iter()
            .map(|n| n.to_uppercase())
            .collect();
        std::fs::write(
            dir.path().join(FEATURE_ORDER_FILE),
            serde_json::to_string(&upper).unwrap(),
        )
        .unwrap();

        let artifacts = load(dir.path()).unwrap();
        assert_eq!(artifacts.feature_order, features::canonical_feature_order());
    }

    #[test]
    fn scaler_transform() {
        let scaler = StandardScaler { mean: 100.0, std: 20.0 };
        assert_eq!(scaler.transform(140.0), 2.0);
        assert_eq!(scaler.transform(100.0), 0.0);
        assert_eq!(scaler.transform(60.0), -2.0);
    }

    #[test]
    fn scaler_transform_guards_zero_std() {
        let scaler = StandardScaler { mean: 0.0, std: 0.0 };
        assert!(scaler.transform(5.0).is_finite());
    }
}
