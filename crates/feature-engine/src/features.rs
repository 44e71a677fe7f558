//! Feature Vector

use crate::schema::CanonicalSchema;
use std::sync::Arc;

/// Encoded record forced onto the canonical schema; the only input the model accepts
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
    schema: Arc<CanonicalSchema>,
}

impl FeatureVector {
    pub(crate) fn new(values: Vec<f64>, schema: Arc<CanonicalSchema>) -> Self {
        debug_assert_eq!(values.len(), schema.len());
        Self { values, schema }
    }

    /// Values in canonical column order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn schema(&self) -> &CanonicalSchema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named canonical column
    pub fn get(&self, column: &str) -> Option<f64> {
        self.schema.position(column).map(|i| self.values[i])
    }

    /// (column, value) pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.schema
            .columns()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Single-precision copy for model runtimes that expect f32 input
    pub fn to_f32(&self) -> Vec<f32> {
        self.values.iter().map(|v| *v as f32).collect()
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}
