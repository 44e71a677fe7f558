//! Model Contract and Loading

use crate::linear::LinearModel;
use crate::onnx::OnnxModel;
use crate::InferenceError;
use feature_engine::FeatureVector;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Prediction for one customer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Class label (churn 0/1)
    pub label: i64,
    /// Positive-class probability when the backend exposes one
    pub probability: Option<f64>,
}

/// Read-only classifier shared across concurrent requests
pub trait Model: Send + Sync {
    /// Backend name for logs and health output
    fn name(&self) -> &str;

    /// Number of features the model was trained on
    fn input_width(&self) -> usize;

    /// Classify one canonical feature vector
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, InferenceError>;

    /// Reject vectors whose width differs from the trained width
    fn check_width(&self, features: &FeatureVector) -> Result<(), InferenceError> {
        if features.len() != self.input_width() {
            return Err(InferenceError::InvalidInputShape {
                expected: self.input_width(),
                actual: features.len(),
            });
        }
        Ok(())
    }
}

/// Load a model file, choosing the backend by extension.
///
/// `.onnx` files run through tract with a `[1, input_width]` input; anything
/// else is read as a JSON linear model.
pub fn load_model(path: &Path, input_width: usize) -> Result<Box<dyn Model>, InferenceError> {
    let model: Box<dyn Model> = match path.extension().and_then(|e| e.to_str()) {
        Some("onnx") => Box::new(OnnxModel::load(path, input_width)?),
        _ => Box::new(LinearModel::load(path)?),
    };

    if model.input_width() != input_width {
        return Err(InferenceError::ModelLoadError(format!(
            "{} expects {} features, schema has {}",
            path.display(),
            model.input_width(),
            input_width
        )));
    }

    info!("Loaded {} model from {}", model.name(), path.display());
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_linear_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, r#"{"weights": [0.5, -0.5], "intercept": 0.0}"#).unwrap();

        let model = load_model(&path, 2).unwrap();
        assert_eq!(model.name(), "linear");
        assert_eq!(model.input_width(), 2);
    }

    #[test]
    fn test_load_rejects_width_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, r#"{"weights": [0.5, -0.5, 1.0], "intercept": 0.0}"#).unwrap();

        assert!(matches!(
            load_model(&path, 2),
            Err(InferenceError::ModelLoadError(_))
        ));
    }

    #[test]
    fn test_load_missing_onnx() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");

        assert!(matches!(
            load_model(&path, 4),
            Err(InferenceError::ModelLoadError(_))
        ));
    }
}
