//! Persisted Artifact Bundle

use crate::error::PipelineError;
use chrono::{DateTime, Utc};
use feature_engine::{CanonicalSchema, Vocabulary};
use inference_engine::{load_model, Model};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const VOCABULARY_FILE: &str = "vocabulary.json";
pub const SCHEMA_FILE: &str = "schema.json";
pub const LINEAR_MODEL_FILE: &str = "model.json";
pub const ONNX_MODEL_FILE: &str = "model.onnx";

/// Bundle manifest naming the version and the files that belong together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub feature_count: usize,
    pub vocabulary: String,
    pub schema: String,
    /// Model file; detected from the directory when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Output of a fit: what serving needs besides the model
#[derive(Debug, Clone, PartialEq)]
pub struct FittedArtifacts {
    pub vocabulary: Vocabulary,
    pub schema: CanonicalSchema,
}

impl FittedArtifacts {
    /// Write vocabulary, schema and manifest into `dir`.
    ///
    /// Model files already in the directory are left alone and recorded in
    /// the manifest.
    pub fn save(&self, dir: &Path, version: &str) -> Result<ArtifactManifest, PipelineError> {
        fs::create_dir_all(dir).map_err(|e| PipelineError::write(dir, e))?;

        write_json(&dir.join(VOCABULARY_FILE), &self.vocabulary)?;
        write_json(&dir.join(SCHEMA_FILE), &self.schema)?;

        let manifest = ArtifactManifest {
            version: version.to_string(),
            created_at: Utc::now(),
            feature_count: self.schema.len(),
            vocabulary: VOCABULARY_FILE.to_string(),
            schema: SCHEMA_FILE.to_string(),
            model: detect_model(dir),
        };
        write_json(&dir.join(MANIFEST_FILE), &manifest)?;

        info!(
            "Saved artifact bundle {} ({} features) to {}",
            manifest.version,
            manifest.feature_count,
            dir.display()
        );
        Ok(manifest)
    }
}

/// Everything a serving process loads at startup, as one unit
pub struct ArtifactBundle {
    pub manifest: ArtifactManifest,
    pub vocabulary: Vocabulary,
    pub schema: CanonicalSchema,
    pub model: Box<dyn Model>,
}

impl ArtifactBundle {
    /// Load manifest, vocabulary, schema and model from `dir`
    pub fn load(dir: &Path) -> Result<Self, PipelineError> {
        let manifest: ArtifactManifest = read_json(&dir.join(MANIFEST_FILE))?;
        let vocabulary: Vocabulary = read_json(&dir.join(&manifest.vocabulary))?;
        let schema: CanonicalSchema = read_json(&dir.join(&manifest.schema))?;

        if manifest.feature_count != schema.len() {
            return Err(PipelineError::load(
                dir.join(&manifest.schema),
                format!(
                    "manifest declares {} features, schema lists {}",
                    manifest.feature_count,
                    schema.len()
                ),
            ));
        }

        let model_file = manifest
            .model
            .clone()
            .or_else(|| detect_model(dir))
            .ok_or_else(|| PipelineError::load(dir, "no model.onnx or model.json in bundle"))?;
        let model_path = dir.join(model_file);
        let model = load_model(&model_path, schema.len())
            .map_err(|e| PipelineError::load(&model_path, e))?;

        info!(
            "Loaded artifact bundle {} from {} ({} features, {} model)",
            manifest.version,
            dir.display(),
            schema.len(),
            model.name()
        );

        Ok(Self {
            manifest,
            vocabulary,
            schema,
            model,
        })
    }
}

fn detect_model(dir: &Path) -> Option<String> {
    [ONNX_MODEL_FILE, LINEAR_MODEL_FILE]
        .into_iter()
        .find(|name| dir.join(name).is_file())
        .map(str::to_string)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PipelineError> {
    let text = fs::read_to_string(path).map_err(|e| PipelineError::load(path, e))?;
    serde_json::from_str(&text).map_err(|e| PipelineError::load(path, e))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PipelineError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| PipelineError::write(path, e))?;
    fs::write(path, text).map_err(|e| PipelineError::write(path, e))
}
