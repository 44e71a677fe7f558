//! Churn Feature Pipeline
//!
//! Sequences cleaning, categorical encoding and schema alignment in two modes:
//! - Fit: one offline pass over training data producing the vocabulary,
//!   canonical schema and training feature table
//! - Serving: per-request transform against artifacts loaded once at startup

mod artifacts;
mod context;
mod error;
mod fit;
mod rename;
mod serve;

pub use artifacts::{
    ArtifactBundle, ArtifactManifest, FittedArtifacts, LINEAR_MODEL_FILE, MANIFEST_FILE,
    ONNX_MODEL_FILE, SCHEMA_FILE, VOCABULARY_FILE,
};
pub use context::ContextHandle;
pub use error::{ErrorKind, PipelineError, Stage};
pub use fit::{FitConfig, FitOutput, FitPipeline, TrainingTable};
pub use rename::{RenameTable, CUSTOMER_FIELDS};
pub use serve::ServingContext;
