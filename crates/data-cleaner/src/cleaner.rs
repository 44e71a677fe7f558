//! Record Cleaner for Numeric Coercion and Identifier Removal

use crate::error::CleanError;
use crate::record::{Dataset, RawRecord, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Cleaner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    /// Text column coerced to a float (the charge total)
    pub numeric_column: String,
    /// Identifier column removed from every record
    pub identifier_column: String,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            numeric_column: "TotalCharges".to_string(),
            identifier_column: "customerID".to_string(),
        }
    }
}

/// Cleaner for raw customer records
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    config: CleanerConfig,
}

impl Cleaner {
    /// Create a new cleaner with given config
    pub fn new(config: CleanerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    /// Parse a value as a finite decimal number.
    ///
    /// Empty, whitespace-only and non-finite inputs are treated as missing.
    pub fn coerce(value: &Value) -> Option<f64> {
        let parsed = match value {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(_) => None,
        };
        parsed.filter(|f| f.is_finite())
    }

    /// Clean a single serving record.
    ///
    /// A singleton cannot be dropped, so a missing or malformed charge value
    /// rejects the record.
    pub fn clean_record(&self, record: &RawRecord) -> Result<RawRecord, CleanError> {
        self.clean_row(record)
    }

    /// Clean a training dataset, dropping rows whose charge value is missing
    pub fn clean_dataset(&self, dataset: &Dataset) -> Dataset {
        let cleaned: Dataset = dataset
            .iter()
            .enumerate()
            .filter_map(|(idx, row)| match self.clean_row(row) {
                Ok(row) => Some(row),
                Err(e) => {
                    debug!("Dropping row {}: {}", idx, e);
                    None
                }
            })
            .collect();

        let dropped = dataset.len() - cleaned.len();
        if dropped > 0 {
            info!(
                "Dropped {} of {} rows with missing {}",
                dropped,
                dataset.len(),
                self.config.numeric_column
            );
        }

        cleaned
    }

    fn clean_row(&self, row: &RawRecord) -> Result<RawRecord, CleanError> {
        let mut cleaned = row.clone();
        cleaned.remove(&self.config.identifier_column);

        let column = &self.config.numeric_column;
        let value = cleaned
            .get(column)
            .ok_or_else(|| CleanError::MissingField(column.clone()))?;

        let number = Self::coerce(value).ok_or_else(|| CleanError::MalformedInput {
            column: column.clone(),
            value: value.to_string(),
        })?;

        cleaned.insert(column.clone(), Value::Float(number));
        Ok(cleaned)
    }
}
