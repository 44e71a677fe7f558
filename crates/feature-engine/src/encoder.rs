//! One-Hot Categorical Encoder

use crate::vocabulary::{CategoryColumn, Vocabulary};
use crate::EncodeError;
use data_cleaner::{Cleaner, Dataset, RawRecord, Value};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Record after one-hot expansion, before schema alignment
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    /// Named output columns: numeric pass-through first, then indicators
    columns: Vec<(String, f64)>,
    /// Width the fitted vocabulary declares for every encoded record
    expected_width: usize,
}

impl EncodedRecord {
    pub(crate) fn new(columns: Vec<(String, f64)>, expected_width: usize) -> Self {
        Self {
            columns,
            expected_width,
        }
    }

    pub fn columns(&self) -> &[(String, f64)] {
        &self.columns
    }

    pub fn expected_width(&self) -> usize {
        self.expected_width
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Encoder bound to a fitted vocabulary
#[derive(Debug, Clone, Copy)]
pub struct CategoricalEncoder<'a> {
    vocabulary: &'a Vocabulary,
}

impl<'a> CategoricalEncoder<'a> {
    /// Fit a vocabulary over a cleaned training dataset.
    ///
    /// A column is categorical when any of its values is text or boolean.
    pub fn fit(dataset: &Dataset) -> Result<Vocabulary, EncodeError> {
        if dataset.is_empty() {
            return Err(EncodeError::EmptyDataset);
        }

        let mut numeric_columns = Vec::new();
        let mut categorical = Vec::new();

        for name in dataset.columns() {
            if dataset.column_values(&name).any(Value::is_categorical) {
                let distinct: BTreeSet<String> = dataset
                    .column_values(&name)
                    .map(|v| v.category_label().into_owned())
                    .collect();
                categorical.push(CategoryColumn::new(name, distinct));
            } else {
                numeric_columns.push(name);
            }
        }

        let vocabulary = Vocabulary::new(numeric_columns, categorical);
        info!(
            "Fitted vocabulary: {} numeric, {} categorical columns, width {}",
            vocabulary.numeric_columns.len(),
            vocabulary.categorical.len(),
            vocabulary.output_width()
        );
        Ok(vocabulary)
    }

    pub fn new(vocabulary: &'a Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Encode one cleaned record.
    ///
    /// Unknown categories produce an all-zero block without error. Only the
    /// vocabulary's numeric columns pass through, so a stray field can never
    /// land in an indicator slot; a numeric column holding text is malformed.
    pub fn transform(&self, record: &RawRecord) -> Result<EncodedRecord, EncodeError> {
        let mut columns = Vec::with_capacity(self.vocabulary.output_width());

        for (name, value) in record.iter() {
            if self.vocabulary.is_categorical(name) {
                continue;
            }
            if !self.vocabulary.is_numeric(name) {
                debug!("Ignoring field outside vocabulary: {}", name);
                continue;
            }
            let number = Self::numeric(value).ok_or_else(|| EncodeError::NonNumeric {
                column: name.to_string(),
                value: value.to_string(),
            })?;
            columns.push((name.to_string(), number));
        }

        for column in &self.vocabulary.categorical {
            let Some(value) = record.get(&column.name) else {
                continue;
            };
            let label = value.category_label();
            let hit = column.position(&label);
            if hit.is_none() && !column.values.iter().any(|v| v == &*label) {
                debug!("Unknown category {:?} for column {}", label, column.name);
            }
            columns.extend(
                column
                    .indicator_names()
                    .enumerate()
                    .map(|(i, name)| (name, if hit == Some(i) { 1.0 } else { 0.0 })),
            );
        }

        Ok(EncodedRecord::new(columns, self.vocabulary.output_width()))
    }

    /// Encode every row of a cleaned dataset
    pub fn transform_dataset(&self, dataset: &Dataset) -> Result<Vec<EncodedRecord>, EncodeError> {
        dataset.iter().map(|row| self.transform(row)).collect()
    }

    fn numeric(value: &Value) -> Option<f64> {
        match value {
            Value::Text(_) => Cleaner::coerce(value),
            other => other.as_f64(),
        }
    }
}
