//! Canonical Schema and Alignment

use crate::encoder::EncodedRecord;
use crate::features::FeatureVector;
use crate::vocabulary::Vocabulary;
use crate::EncodeError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Ordered list of output column names agreed at training time.
///
/// Serialized as a plain JSON array; duplicates are rejected on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CanonicalSchema {
    columns: Vec<String>,
}

impl CanonicalSchema {
    pub fn new(columns: Vec<String>) -> Result<Self, EncodeError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(EncodeError::DuplicateColumn(column.clone()));
            }
        }
        Ok(Self { columns })
    }

    /// Derive the schema from a fitted vocabulary's output columns
    pub fn from_vocabulary(vocabulary: &Vocabulary) -> Self {
        Self {
            columns: vocabulary.feature_names(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Whether this schema is exactly what `vocabulary` produces
    pub fn matches(&self, vocabulary: &Vocabulary) -> bool {
        self.columns == vocabulary.feature_names()
    }
}

impl TryFrom<Vec<String>> for CanonicalSchema {
    type Error = EncodeError;

    fn try_from(columns: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(columns)
    }
}

impl From<CanonicalSchema> for Vec<String> {
    fn from(schema: CanonicalSchema) -> Self {
        schema.columns
    }
}

/// Forces encoded records onto a canonical schema
#[derive(Debug, Clone)]
pub struct SchemaAligner {
    schema: Arc<CanonicalSchema>,
    index: HashMap<String, usize>,
}

impl SchemaAligner {
    pub fn new(schema: CanonicalSchema) -> Self {
        let index = schema
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self {
            schema: Arc::new(schema),
            index,
        }
    }

    pub fn schema(&self) -> &CanonicalSchema {
        &self.schema
    }

    /// Align an encoded record.
    ///
    /// Canonical columns absent from the record are zero-filled, extra columns
    /// are dropped and the rest reordered. The encoder's declared width must
    /// equal the schema length, otherwise the vocabulary and schema belong to
    /// different fits.
    pub fn align(&self, encoded: &EncodedRecord) -> Result<FeatureVector, EncodeError> {
        let expected = self.schema.len();
        if encoded.expected_width() != expected {
            return Err(EncodeError::SchemaMismatch {
                expected,
                actual: encoded.expected_width(),
            });
        }

        let mut values = vec![0.0; expected];
        let mut dropped = 0usize;
        for (name, value) in encoded.columns() {
            match self.index.get(name) {
                Some(&i) => values[i] = *value,
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            debug!("Dropped {} columns outside the canonical schema", dropped);
        }

        Ok(FeatureVector::new(values, Arc::clone(&self.schema)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{CategoricalEncoder, EncodedRecord};
    use data_cleaner::{Dataset, RawRecord};

    fn training() -> Dataset {
        Dataset::from_rows(vec![
            RawRecord::new()
                .with("SeniorCitizen", 0i64)
                .with("gender", "Female")
                .with("tenure", 1i64)
                .with("Contract", "Month-to-month"),
            RawRecord::new()
                .with("SeniorCitizen", 1i64)
                .with("gender", "Male")
                .with("tenure", 34i64)
                .with("Contract", "One year"),
            RawRecord::new()
                .with("SeniorCitizen", 0i64)
                .with("gender", "Male")
                .with("tenure", 2i64)
                .with("Contract", "Two year"),
        ])
    }

    fn fitted() -> (Vocabulary, SchemaAligner) {
        let vocab = CategoricalEncoder::fit(&training()).unwrap();
        let aligner = SchemaAligner::new(CanonicalSchema::from_vocabulary(&vocab));
        (vocab, aligner)
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let err = CanonicalSchema::new(vec!["a".into(), "b".into(), "a".into()]).unwrap_err();
        assert_eq!(err, EncodeError::DuplicateColumn("a".into()));

        let parsed: Result<CanonicalSchema, _> = serde_json::from_str(r#"["x", "x"]"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_schema_wire_form_is_plain_list() {
        let schema = CanonicalSchema::new(vec!["tenure".into(), "gender_Male".into()]).unwrap();
        assert_eq!(serde_json::to_string(&schema).unwrap(), r#"["tenure","gender_Male"]"#);
    }

    #[test]
    fn test_align_orders_and_zero_fills() {
        let (vocab, aligner) = fitted();
        // Fields arrive out of order and without SeniorCitizen
        let record = RawRecord::new()
            .with("Contract", "Two year")
            .with("tenure", 9i64)
            .with("gender", "Male");

        let encoded = CategoricalEncoder::new(&vocab).transform(&record).unwrap();
        let vector = aligner.align(&encoded).unwrap();

        assert_eq!(vector.len(), aligner.schema().len());
        let names: Vec<&str> = vector.iter().map(|(n, _)| n).collect();
        assert_eq!(names, aligner.schema().columns());
        assert_eq!(vector.get("SeniorCitizen"), Some(0.0));
        assert_eq!(vector.get("tenure"), Some(9.0));
        assert_eq!(vector.get("Contract_Two year"), Some(1.0));
    }

    #[test]
    fn test_align_drops_extra_columns() {
        let (vocab, aligner) = fitted();
        let encoded = EncodedRecord::new(
            vec![("tenure".into(), 3.0), ("extraScore".into(), 0.75)],
            vocab.output_width(),
        );

        let vector = aligner.align(&encoded).unwrap();
        assert_eq!(vector.get("extraScore"), None);
        assert_eq!(vector.len(), vocab.output_width());
    }

    #[test]
    fn test_corrupted_schema_is_mismatch() {
        let (vocab, _) = fitted();
        let mut columns = vocab.feature_names();
        columns.pop();
        let aligner = SchemaAligner::new(CanonicalSchema::new(columns).unwrap());

        let record = RawRecord::new().with("tenure", 1i64).with("gender", "Male");
        let encoded = CategoricalEncoder::new(&vocab).transform(&record).unwrap();

        assert_eq!(
            aligner.align(&encoded),
            Err(EncodeError::SchemaMismatch {
                expected: vocab.output_width() - 1,
                actual: vocab.output_width(),
            })
        );
    }

    #[test]
    fn test_matches_vocabulary() {
        let (vocab, aligner) = fitted();
        assert!(aligner.schema().matches(&vocab));

        let reordered = CanonicalSchema::new(vocab.feature_names().into_iter().rev().collect()).unwrap();
        assert!(!reordered.matches(&vocab));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn record_strategy() -> impl Strategy<Value = RawRecord> {
            (
                prop::sample::select(vec!["Male", "Female", "Other"]),
                prop::sample::select(vec!["Month-to-month", "One year", "Two year", "Decade"]),
                0i64..72,
                prop::bool::ANY,
            )
                .prop_map(|(gender, contract, tenure, senior)| {
                    RawRecord::new()
                        .with("Contract", contract)
                        .with("SeniorCitizen", senior as i64)
                        .with("gender", gender)
                        .with("tenure", tenure)
                })
        }

        proptest! {
            #[test]
            fn aligned_width_and_order_match_schema(record in record_strategy()) {
                let (vocab, aligner) = fitted();
                let encoder = CategoricalEncoder::new(&vocab);

                let vector = aligner.align(&encoder.transform(&record).unwrap()).unwrap();

                prop_assert_eq!(vector.len(), aligner.schema().len());
                let names: Vec<&str> = vector.iter().map(|(n, _)| n).collect();
                prop_assert_eq!(names, aligner.schema().columns());
            }

            #[test]
            fn encoding_is_deterministic(record in record_strategy()) {
                let (vocab, aligner) = fitted();
                let encoder = CategoricalEncoder::new(&vocab);

                let first = aligner.align(&encoder.transform(&record).unwrap()).unwrap();
                let second = aligner.align(&encoder.transform(&record).unwrap()).unwrap();

                let first_bits: Vec<u64> = first.values().iter().map(|v| v.to_bits()).collect();
                let second_bits: Vec<u64> = second.values().iter().map(|v| v.to_bits()).collect();
                prop_assert_eq!(first_bits, second_bits);
            }

            #[test]
            fn contract_block_has_at_most_one_hot(record in record_strategy()) {
                let (vocab, aligner) = fitted();
                let vector = aligner
                    .align(&CategoricalEncoder::new(&vocab).transform(&record).unwrap())
                    .unwrap();

                let hot: f64 = vector
                    .iter()
                    .filter(|(n, _)| n.starts_with("Contract_"))
                    .map(|(_, v)| v)
                    .sum();
                prop_assert!(hot == 0.0 || hot == 1.0);
            }
        }
    }
}
