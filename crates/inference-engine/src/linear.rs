//! Logistic Linear Model

use crate::engine::{Model, Prediction};
use crate::InferenceError;
use feature_engine::FeatureVector;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

fn default_threshold() -> f64 {
    0.5
}

/// Logistic regression weights exported from training, one per canonical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    pub intercept: f64,
    /// Probability at or above which the positive class is predicted
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl LinearModel {
    pub fn new(weights: Vec<f64>, intercept: f64) -> Self {
        Self {
            weights,
            intercept,
            threshold: default_threshold(),
        }
    }

    /// Read model weights from a JSON file
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let text = fs::read_to_string(path)
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;
        let model: Self = serde_json::from_str(&text)
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;

        if !(0.0..=1.0).contains(&model.threshold) {
            return Err(InferenceError::ModelLoadError(format!(
                "threshold {} outside [0, 1]",
                model.threshold
            )));
        }
        Ok(model)
    }

    /// Write model weights as JSON
    pub fn save(&self, path: &Path) -> Result<(), InferenceError> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| InferenceError::ModelLoadError(e.to_string()))?;
        fs::write(path, text)
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))
    }

    fn probability(&self, values: &[f64]) -> f64 {
        let z: f64 = self
            .weights
            .iter()
            .zip(values)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        1.0 / (1.0 + (-z).exp())
    }
}

impl Model for LinearModel {
    fn name(&self) -> &str {
        "linear"
    }

    fn input_width(&self) -> usize {
        self.weights.len()
    }

    fn predict(&self, features: &FeatureVector) -> Result<Prediction, InferenceError> {
        self.check_width(features)?;

        let probability = self.probability(features.values());
        let label = i64::from(probability >= self.threshold);
        debug!("Linear prediction: p={:.4}, label={}", probability, label);

        Ok(Prediction {
            label,
            probability: Some(probability),
        })
    }
}
