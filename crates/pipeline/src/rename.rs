//! External to Canonical Field Names

use crate::error::PipelineError;
use data_cleaner::RawRecord;
use feature_engine::Vocabulary;
use tracing::warn;

/// Customer request fields (camelCase) and their training column names
pub const CUSTOMER_FIELDS: [(&str, &str); 19] = [
    ("gender", "gender"),
    ("seniorCitizen", "SeniorCitizen"),
    ("partner", "Partner"),
    ("dependents", "Dependents"),
    ("tenure", "tenure"),
    ("phoneService", "PhoneService"),
    ("multipleLines", "MultipleLines"),
    ("internetService", "InternetService"),
    ("onlineSecurity", "OnlineSecurity"),
    ("onlineBackup", "OnlineBackup"),
    ("deviceProtection", "DeviceProtection"),
    ("techSupport", "TechSupport"),
    ("streamingTV", "StreamingTV"),
    ("streamingMovies", "StreamingMovies"),
    ("contract", "Contract"),
    ("paperlessBilling", "PaperlessBilling"),
    ("paymentMethod", "PaymentMethod"),
    ("monthlyCharges", "MonthlyCharges"),
    ("totalCharges", "TotalCharges"),
];

/// Static rename table; unmapped fields pass through unchanged
#[derive(Debug, Clone, Copy)]
pub struct RenameTable {
    entries: &'static [(&'static str, &'static str)],
}

impl RenameTable {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    /// Table for the customer prediction request
    pub const fn customer() -> Self {
        Self::new(&CUSTOMER_FIELDS)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical name for an external field
    pub fn canonical(&self, external: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(ext, _)| *ext == external)
            .map(|(_, canonical)| *canonical)
    }

    /// Fail unless every external field has an entry
    pub fn check_complete(&self, external_fields: &[&str]) -> Result<(), PipelineError> {
        let missing: Vec<String> = external_fields
            .iter()
            .filter(|f| self.canonical(f).is_none())
            .map(|f| f.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::IncompleteRenameTable(missing))
        }
    }

    /// Canonical names the vocabulary has never seen, logged at startup
    pub fn unknown_to(&self, vocabulary: &Vocabulary) -> Vec<&'static str> {
        let unknown: Vec<&'static str> = self
            .entries
            .iter()
            .map(|(_, canonical)| *canonical)
            .filter(|c| !vocabulary.is_categorical(c) && !vocabulary.is_numeric(c))
            .collect();
        if !unknown.is_empty() {
            warn!("Rename targets not present in vocabulary: {:?}", unknown);
        }
        unknown
    }

    /// Rename a record's fields to canonical names, preserving order
    pub fn apply(&self, record: &RawRecord) -> RawRecord {
        record
            .iter()
            .map(|(name, value)| {
                let name = self.canonical(name).unwrap_or(name);
                (name.to_string(), value.clone())
            })
            .collect()
    }
}

impl Default for RenameTable {
    fn default() -> Self {
        Self::customer()
    }
}
