//! Pipeline Error Types

use data_cleaner::CleanError;
use feature_engine::EncodeError;
use inference_engine::InferenceError;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification callers branch on instead of matching messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad request data (serving) or unusable value
    MalformedInput,
    /// Vocabulary, schema and model disagree on the feature layout
    SchemaMismatch,
    /// Artifacts missing or unreadable
    ArtifactLoadFailure,
    /// Artifacts could not be written
    ArtifactWriteFailure,
    /// Training data unusable for fitting
    InvalidTrainingData,
    /// Model backend failed at prediction time
    ModelFailure,
}

impl ErrorKind {
    /// Stable label for metrics and response bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedInput => "malformed_input",
            ErrorKind::SchemaMismatch => "schema_mismatch",
            ErrorKind::ArtifactLoadFailure => "artifact_load_failure",
            ErrorKind::ArtifactWriteFailure => "artifact_write_failure",
            ErrorKind::InvalidTrainingData => "invalid_training_data",
            ErrorKind::ModelFailure => "model_failure",
        }
    }
}

/// Pipeline stage where an error originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Clean,
    Encode,
    Align,
    Predict,
    Fit,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Clean => "clean",
            Stage::Encode => "encode",
            Stage::Align => "align",
            Stage::Predict => "predict",
            Stage::Fit => "fit",
            Stage::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the fit and serving pipelines
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("clean stage: {0}")]
    Clean(#[from] CleanError),

    #[error("encode stage: {0}")]
    Encode(EncodeError),

    #[error("align stage: {0}")]
    Align(EncodeError),

    #[error("predict stage: {0}")]
    Predict(#[from] InferenceError),

    #[error("schema column {position} is {schema_column:?} but vocabulary produces {vocabulary_column:?}")]
    SchemaDrift {
        position: usize,
        schema_column: String,
        vocabulary_column: String,
    },

    #[error("failed to load artifact {path}: {reason}")]
    ArtifactLoad { path: PathBuf, reason: String },

    #[error("failed to write artifact {path}: {reason}")]
    ArtifactWrite { path: PathBuf, reason: String },

    #[error("target column {column}: {reason}")]
    InvalidTarget { column: String, reason: String },

    #[error("rename table has no entry for external fields {0:?}")]
    IncompleteRenameTable(Vec<String>),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Clean(CleanError::MalformedInput { .. } | CleanError::MissingField(_)) => {
                ErrorKind::MalformedInput
            }
            PipelineError::Clean(CleanError::Csv(_) | CleanError::Io(_)) => ErrorKind::InvalidTrainingData,
            PipelineError::Encode(EncodeError::NonNumeric { .. }) => ErrorKind::MalformedInput,
            PipelineError::Encode(EncodeError::EmptyDataset) => ErrorKind::InvalidTrainingData,
            PipelineError::Encode(_) | PipelineError::Align(_) => ErrorKind::SchemaMismatch,
            PipelineError::Predict(InferenceError::InvalidInputShape { .. }) => ErrorKind::SchemaMismatch,
            PipelineError::Predict(InferenceError::ModelLoadError(_)) => ErrorKind::ArtifactLoadFailure,
            PipelineError::Predict(_) => ErrorKind::ModelFailure,
            PipelineError::SchemaDrift { .. } => ErrorKind::SchemaMismatch,
            PipelineError::ArtifactLoad { .. } | PipelineError::IncompleteRenameTable(_) => {
                ErrorKind::ArtifactLoadFailure
            }
            PipelineError::ArtifactWrite { .. } => ErrorKind::ArtifactWriteFailure,
            PipelineError::InvalidTarget { .. } => ErrorKind::InvalidTrainingData,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Clean(_) => Stage::Clean,
            PipelineError::Encode(_) => Stage::Encode,
            PipelineError::Align(_) => Stage::Align,
            PipelineError::Predict(_) => Stage::Predict,
            PipelineError::SchemaDrift { .. }
            | PipelineError::ArtifactLoad { .. }
            | PipelineError::IncompleteRenameTable(_) => Stage::Load,
            PipelineError::ArtifactWrite { .. } => Stage::Persist,
            PipelineError::InvalidTarget { .. } => Stage::Fit,
        }
    }

    pub(crate) fn load(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        PipelineError::ArtifactLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        PipelineError::ArtifactWrite {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
