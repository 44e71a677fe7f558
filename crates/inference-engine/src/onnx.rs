//! ONNX Model via tract

use crate::engine::{Model, Prediction};
use crate::InferenceError;
use feature_engine::FeatureVector;
use std::path::Path;
use tracing::{debug, info};
use tract_onnx::prelude::*;

/// ONNX classifier exported from training (label output first)
pub struct OnnxModel {
    plan: TypedRunnableModel<TypedModel>,
    input_width: usize,
}

impl OnnxModel {
    /// Load and optimize an ONNX graph with a fixed `[1, input_width]` f32 input
    pub fn load(path: &Path, input_width: usize) -> Result<Self, InferenceError> {
        info!("Loading ONNX model from {}", path.display());
        let plan = Self::build(path, input_width)
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;
        Ok(Self { plan, input_width })
    }

    fn build(path: &Path, input_width: usize) -> TractResult<TypedRunnableModel<TypedModel>> {
        tract_onnx::onnx()
            .model_for_path(path)?
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), [1, input_width]))?
            .into_optimized()?
            .into_runnable()
    }

    fn run(&self, features: &FeatureVector) -> Result<Prediction, InferenceError> {
        let input = Tensor::from_shape(&[1, self.input_width], &features.to_f32()).map_err(failed)?;
        let outputs = self.plan.run(tvec!(input.into())).map_err(failed)?;
        let first = outputs
            .first()
            .ok_or_else(|| InferenceError::InferenceFailed("model produced no outputs".to_string()))?;
        decode_output(first)
    }
}

/// Read a prediction from the first graph output.
///
/// Int64 outputs are labels. Float outputs are scores: a trailing dimension of
/// two holds `[P(0), P(1)]`, anything else is the positive-class score.
fn decode_output(output: &Tensor) -> Result<Prediction, InferenceError> {
    let empty = || InferenceError::InferenceFailed("model returned an empty output".to_string());

    if output.datum_type() == i64::datum_type() {
        let label = output
            .to_array_view::<i64>()
            .map_err(failed)?
            .iter()
            .next()
            .copied()
            .ok_or_else(empty)?;
        return Ok(Prediction {
            label,
            probability: None,
        });
    }

    let scores = output.cast_to::<f32>().map_err(failed)?;
    let view = scores.to_array_view::<f32>().map_err(failed)?;
    let positive = match output.shape().last() {
        Some(2) => view.iter().nth(1),
        _ => view.iter().next(),
    }
    .copied()
    .ok_or_else(empty)?;

    let probability = f64::from(positive);
    Ok(Prediction {
        label: i64::from(probability >= 0.5),
        probability: Some(probability),
    })
}

fn failed(e: impl std::fmt::Display) -> InferenceError {
    InferenceError::InferenceFailed(e.to_string())
}

impl Model for OnnxModel {
    fn name(&self) -> &str {
        "onnx"
    }

    fn input_width(&self) -> usize {
        self.input_width
    }

    fn predict(&self, features: &FeatureVector) -> Result<Prediction, InferenceError> {
        self.check_width(features)?;

        let prediction = self.run(features)?;
        debug!("ONNX prediction: label={}", prediction.label);
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.map_or(false, |a| (a - b).abs() < 1e-6)
    }

    #[test]
    fn test_label_output_used_directly() {
        let prediction = decode_output(&tensor1(&[1i64])).unwrap();
        assert_eq!(prediction.label, 1);
        assert_eq!(prediction.probability, None);
    }

    #[test]
    fn test_single_score_thresholded() {
        let prediction = decode_output(&tensor2(&[[0.8f32]])).unwrap();
        assert_eq!(prediction.label, 1);
        assert!(approx(prediction.probability, 0.8));

        let prediction = decode_output(&tensor2(&[[0.3f32]])).unwrap();
        assert_eq!(prediction.label, 0);
    }

    #[test]
    fn test_two_class_scores_use_positive_column() {
        let prediction = decode_output(&tensor2(&[[0.9f32, 0.1]])).unwrap();
        assert_eq!(prediction.label, 0);
        assert!(approx(prediction.probability, 0.1));

        let prediction = decode_output(&tensor2(&[[0.25f64, 0.75]])).unwrap();
        assert_eq!(prediction.label, 1);
        assert!(approx(prediction.probability, 0.75));
    }

    #[test]
    fn test_empty_output_is_error() {
        let empty: &[i64] = &[];
        assert!(matches!(
            decode_output(&tensor1(empty)),
            Err(InferenceError::InferenceFailed(_))
        ));
    }

    #[test]
    fn test_invalid_graph_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        fs::write(&path, b"not an onnx graph").unwrap();

        assert!(matches!(
            OnnxModel::load(&path, 4),
            Err(InferenceError::ModelLoadError(_))
        ));
    }
}
