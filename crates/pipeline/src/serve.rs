//! Serving Pipeline
//!
//! Per-request transform against a vocabulary, schema and model loaded once.
//! Nothing here refits: unseen categories encode as all-zero blocks and the
//! output width is always the canonical schema width.

use crate::artifacts::ArtifactBundle;
use crate::error::PipelineError;
use crate::rename::RenameTable;
use data_cleaner::{Cleaner, CleanerConfig, RawRecord};
use feature_engine::{
    CanonicalSchema, CategoricalEncoder, EncodeError, FeatureVector, SchemaAligner, Vocabulary,
};
use inference_engine::{InferenceError, Model, Prediction};
use std::path::Path;
use tracing::{debug, info};

/// Immutable serving state shared by all concurrent requests
pub struct ServingContext {
    rename: RenameTable,
    cleaner: Cleaner,
    vocabulary: Vocabulary,
    aligner: SchemaAligner,
    model: Box<dyn Model>,
    version: String,
}

impl ServingContext {
    /// Build a context, rejecting artifacts that disagree on the feature layout
    pub fn new(
        vocabulary: Vocabulary,
        schema: CanonicalSchema,
        model: Box<dyn Model>,
        version: impl Into<String>,
    ) -> Result<Self, PipelineError> {
        check_layout(&vocabulary, &schema)?;

        if model.input_width() != schema.len() {
            return Err(PipelineError::Predict(InferenceError::InvalidInputShape {
                expected: schema.len(),
                actual: model.input_width(),
            }));
        }

        let rename = RenameTable::customer();
        rename.unknown_to(&vocabulary);

        let version = version.into();
        info!(
            "Serving context {} ready: {} features, {} model",
            version,
            schema.len(),
            model.name()
        );

        Ok(Self {
            rename,
            cleaner: Cleaner::default(),
            vocabulary,
            aligner: SchemaAligner::new(schema),
            model,
            version,
        })
    }

    pub fn from_bundle(bundle: ArtifactBundle) -> Result<Self, PipelineError> {
        Self::new(
            bundle.vocabulary,
            bundle.schema,
            bundle.model,
            bundle.manifest.version,
        )
    }

    /// Load and validate the bundle in `dir`
    pub fn load(dir: &Path) -> Result<Self, PipelineError> {
        Self::from_bundle(ArtifactBundle::load(dir)?)
    }

    pub fn with_cleaner(mut self, config: CleanerConfig) -> Self {
        self.cleaner = Cleaner::new(config);
        self
    }

    pub fn with_rename_table(mut self, rename: RenameTable) -> Self {
        self.rename = rename;
        self
    }

    /// Rename, clean, encode and align one record
    pub fn transform(&self, record: &RawRecord) -> Result<FeatureVector, PipelineError> {
        let renamed = self.rename.apply(record);
        let cleaned = self.cleaner.clean_record(&renamed)?;
        let encoded = CategoricalEncoder::new(&self.vocabulary)
            .transform(&cleaned)
            .map_err(PipelineError::Encode)?;
        self.aligner.align(&encoded).map_err(PipelineError::Align)
    }

    /// Transform one record and classify it
    pub fn predict(&self, record: &RawRecord) -> Result<Prediction, PipelineError> {
        let features = self.transform(record)?;
        let prediction = self.model.predict(&features)?;
        debug!("Prediction {} under {}", prediction.label, self.version);
        Ok(prediction)
    }

    pub fn schema(&self) -> &CanonicalSchema {
        self.aligner.schema()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }
}

fn check_layout(vocabulary: &Vocabulary, schema: &CanonicalSchema) -> Result<(), PipelineError> {
    let produced = vocabulary.feature_names();
    if produced.len() != schema.len() {
        return Err(PipelineError::Align(EncodeError::SchemaMismatch {
            expected: schema.len(),
            actual: produced.len(),
        }));
    }

    for (position, (schema_column, vocabulary_column)) in
        schema.columns().iter().zip(produced).enumerate()
    {
        if *schema_column != vocabulary_column {
            return Err(PipelineError::SchemaDrift {
                position,
                schema_column: schema_column.clone(),
                vocabulary_column,
            });
        }
    }
    Ok(())
}
