//! Fitted Category Vocabulary

use serde::{Deserialize, Serialize};

/// Fitted categories for one categorical column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryColumn {
    /// Source column name
    pub name: String,
    /// Sorted distinct values seen at fit time
    pub values: Vec<String>,
    /// Two-valued column collapsed to a single indicator
    pub binary: bool,
}

impl CategoryColumn {
    /// Build a column from its distinct values, sorting them and applying
    /// binary collapse when exactly two values exist
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = String>) -> Self {
        let mut values: Vec<String> = values.into_iter().collect();
        values.sort();
        values.dedup();
        let binary = values.len() == 2;
        Self {
            name: name.into(),
            values,
            binary,
        }
    }

    /// Values that own an indicator column. A collapsed column keeps only
    /// the second value; the first encodes as zero.
    pub fn indicator_values(&self) -> &[String] {
        if self.binary && self.values.len() == 2 {
            &self.values[1..]
        } else {
            &self.values
        }
    }

    /// Number of indicator columns this column expands into
    pub fn width(&self) -> usize {
        self.indicator_values().len()
    }

    /// Offset of the indicator set for `label`, `None` for unknown labels
    /// and for the dropped value of a collapsed column
    pub fn position(&self, label: &str) -> Option<usize> {
        self.indicator_values().iter().position(|v| v == label)
    }

    /// Indicator column names, `<column>_<value>`
    pub fn indicator_names(&self) -> impl Iterator<Item = String> + '_ {
        self.indicator_values()
            .iter()
            .map(move |v| format!("{}_{}", self.name, v))
    }
}

/// Vocabulary fitted once over training data and reused for every transform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Numeric pass-through columns in dataset order
    pub numeric_columns: Vec<String>,
    /// Categorical columns in dataset order
    pub categorical: Vec<CategoryColumn>,
}

impl Vocabulary {
    pub fn new(numeric_columns: Vec<String>, categorical: Vec<CategoryColumn>) -> Self {
        Self {
            numeric_columns,
            categorical,
        }
    }

    /// Look up a categorical column by name
    pub fn column(&self, name: &str) -> Option<&CategoryColumn> {
        self.categorical.iter().find(|c| c.name == name)
    }

    pub fn is_categorical(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.numeric_columns.iter().any(|c| c == name)
    }

    /// Number of output columns an encoded record has
    pub fn output_width(&self) -> usize {
        self.numeric_columns.len() + self.categorical.iter().map(CategoryColumn::width).sum::<usize>()
    }

    /// Output column names: numeric columns followed by indicator blocks
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.output_width());
        names.extend(self.numeric_columns.iter().cloned());
        for column in &self.categorical {
            names.extend(column.indicator_names());
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_binary_collapse_keeps_second_value() {
        let gender = CategoryColumn::new("gender", strings(&["Male", "Female", "Male"]));

        assert!(gender.binary);
        assert_eq!(gender.values, strings(&["Female", "Male"]));
        assert_eq!(gender.width(), 1);
        assert_eq!(gender.indicator_names().collect::<Vec<_>>(), vec!["gender_Male"]);
        assert_eq!(gender.position("Male"), Some(0));
        assert_eq!(gender.position("Female"), None);
    }

    #[test]
    fn test_multi_value_column() {
        let contract = CategoryColumn::new(
            "Contract",
            strings(&["Two year", "Month-to-month", "One year"]),
        );

        assert!(!contract.binary);
        assert_eq!(
            contract.indicator_names().collect::<Vec<_>>(),
            vec!["Contract_Month-to-month", "Contract_One year", "Contract_Two year"]
        );
        assert_eq!(contract.position("One year"), Some(1));
        assert_eq!(contract.position("Ten year"), None);
    }

    #[test]
    fn test_single_value_column_not_collapsed() {
        let only = CategoryColumn::new("PhoneService", strings(&["Yes"]));
        assert!(!only.binary);
        assert_eq!(only.width(), 1);
    }

    #[test]
    fn test_feature_names_and_width() {
        let vocab = Vocabulary::new(
            strings(&["tenure", "MonthlyCharges"]),
            vec![
                CategoryColumn::new("gender", strings(&["Female", "Male"])),
                CategoryColumn::new("Contract", strings(&["Month-to-month", "One year", "Two year"])),
            ],
        );

        assert_eq!(vocab.output_width(), 6);
        assert_eq!(
            vocab.feature_names(),
            vec![
                "tenure",
                "MonthlyCharges",
                "gender_Male",
                "Contract_Month-to-month",
                "Contract_One year",
                "Contract_Two year",
            ]
        );
        assert!(vocab.is_categorical("gender"));
        assert!(vocab.is_numeric("tenure"));
    }

    #[test]
    fn test_vocabulary_json_roundtrip_is_verbatim() {
        let vocab = Vocabulary::new(
            strings(&["tenure"]),
            vec![CategoryColumn::new("Partner", strings(&["No", "Yes"]))],
        );
        let json = serde_json::to_string(&vocab).unwrap();
        let loaded: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, vocab);
    }
}
