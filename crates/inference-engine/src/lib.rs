//! Churn Classifier Inference
//!
//! The classifier is a black box behind [`Model::predict`]: one canonical
//! feature vector in, one class label out. Backends are a JSON linear model
//! and an ONNX graph executed with tract.

mod engine;
mod linear;
mod onnx;

pub use engine::{load_model, Model, Prediction};
pub use linear::LinearModel;
pub use onnx::OnnxModel;

use thiserror::Error;

/// Errors during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
}
