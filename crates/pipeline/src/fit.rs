//! Batch Fit Pipeline

use crate::artifacts::FittedArtifacts;
use crate::error::PipelineError;
use data_cleaner::{Cleaner, CleanerConfig, Dataset, RawRecord};
use feature_engine::{CanonicalSchema, CategoricalEncoder, FeatureVector, SchemaAligner};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Fit configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    pub cleaner: CleanerConfig,
    /// Label column split off before fitting; must be two-valued
    pub target_column: Option<String>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            cleaner: CleanerConfig::default(),
            target_column: Some("Churn".to_string()),
        }
    }
}

/// Transformed training data in canonical column order
#[derive(Debug, Clone)]
pub struct TrainingTable {
    pub schema: CanonicalSchema,
    pub rows: Vec<FeatureVector>,
    /// Binary labels, present when a target column was fit
    pub labels: Option<Vec<i64>>,
    pub target_column: Option<String>,
}

impl TrainingTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the table as CSV: canonical header, then the label column
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);

        let mut header: Vec<&str> = self.schema.columns().iter().map(String::as_str).collect();
        if let (Some(target), Some(_)) = (&self.target_column, &self.labels) {
            header.push(target);
        }
        wtr.write_record(&header)?;

        for (i, row) in self.rows.iter().enumerate() {
            let mut fields: Vec<String> = row.values().iter().map(f64::to_string).collect();
            if let Some(labels) = &self.labels {
                fields.push(labels[i].to_string());
            }
            wtr.write_record(&fields)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_csv_path(&self, path: &Path) -> Result<(), PipelineError> {
        let file = std::fs::File::create(path).map_err(|e| PipelineError::write(path, e))?;
        self.write_csv(file).map_err(|e| PipelineError::write(path, e))
    }
}

/// Result of one fit run
#[derive(Debug, Clone)]
pub struct FitOutput {
    pub artifacts: FittedArtifacts,
    pub table: TrainingTable,
}

/// One-shot offline fit: clean, fit vocabulary, derive schema, transform
#[derive(Debug, Clone)]
pub struct FitPipeline {
    cleaner: Cleaner,
    target_column: Option<String>,
}

impl FitPipeline {
    pub fn new(config: FitConfig) -> Self {
        Self {
            cleaner: Cleaner::new(config.cleaner),
            target_column: config.target_column,
        }
    }

    pub fn run(&self, dataset: &Dataset) -> Result<FitOutput, PipelineError> {
        info!("Starting fit over {} rows", dataset.len());

        let cleaned = self.cleaner.clean_dataset(dataset);
        let (features, labels) = self.split_target(cleaned)?;

        let vocabulary = CategoricalEncoder::fit(&features).map_err(PipelineError::Encode)?;
        let schema = CanonicalSchema::from_vocabulary(&vocabulary);
        let aligner = SchemaAligner::new(schema.clone());
        let encoder = CategoricalEncoder::new(&vocabulary);

        let rows = features
            .iter()
            .map(|row| {
                let encoded = encoder.transform(row).map_err(PipelineError::Encode)?;
                aligner.align(&encoded).map_err(PipelineError::Align)
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!("Fit complete: {} rows, {} features", rows.len(), schema.len());

        Ok(FitOutput {
            table: TrainingTable {
                schema: schema.clone(),
                rows,
                target_column: labels.as_ref().and(self.target_column.clone()),
                labels,
            },
            artifacts: FittedArtifacts { vocabulary, schema },
        })
    }

    /// Remove the target column and encode it 0/1 in sorted value order
    fn split_target(&self, dataset: Dataset) -> Result<(Dataset, Option<Vec<i64>>), PipelineError> {
        let Some(target) = &self.target_column else {
            return Ok((dataset, None));
        };
        if dataset.column_values(target).next().is_none() {
            warn!("Target column {} not found, fitting without labels", target);
            return Ok((dataset, None));
        }

        let classes: Vec<String> = dataset
            .column_values(target)
            .map(|v| v.category_label().into_owned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let [_, positive] = classes.as_slice() else {
            return Err(PipelineError::InvalidTarget {
                column: target.clone(),
                reason: format!("expected 2 classes, found {}: {:?}", classes.len(), classes),
            });
        };
        let positive = positive.clone();

        let mut rows: Vec<RawRecord> = Vec::with_capacity(dataset.len());
        let mut labels = Vec::with_capacity(dataset.len());
        for (idx, mut row) in dataset.into_rows().into_iter().enumerate() {
            let value = row.remove(target).ok_or_else(|| PipelineError::InvalidTarget {
                column: target.clone(),
                reason: format!("row {} has no value", idx),
            })?;
            labels.push(i64::from(value.category_label() == positive.as_str()));
            rows.push(row);
        }

        info!("Target {}: positive class {:?}", target, positive);
        Ok((Dataset::from_rows(rows), Some(labels)))
    }
}

impl Default for FitPipeline {
    fn default() -> Self {
        Self::new(FitConfig::default())
    }
}
