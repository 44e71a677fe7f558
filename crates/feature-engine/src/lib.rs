//! Feature Encoding Engine
//!
//! Turns cleaned customer records into fixed-width numeric feature vectors:
//! one-hot expansion against a fitted vocabulary, then alignment onto the
//! canonical schema the model was trained against.

mod encoder;
mod features;
mod schema;
mod vocabulary;

pub use encoder::{CategoricalEncoder, EncodedRecord};
pub use features::FeatureVector;
pub use schema::{CanonicalSchema, SchemaAligner};
pub use vocabulary::{CategoryColumn, Vocabulary};

use thiserror::Error;

/// Errors during encoding and alignment
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("Cannot fit vocabulary on an empty dataset")]
    EmptyDataset,
    #[error("Non-numeric value {value:?} in numeric column {column}")]
    NonNumeric { column: String, value: String },
    #[error("Schema mismatch: canonical schema has {expected} columns, encoder produces {actual}")]
    SchemaMismatch { expected: usize, actual: usize },
    #[error("Duplicate column in canonical schema: {0}")]
    DuplicateColumn(String),
}
