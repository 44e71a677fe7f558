//! CSV Loading with Per-Column Type Inference

use crate::error::CleanError;
use crate::record::{Dataset, RawRecord, Value};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

/// Inferred storage type of a CSV column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every cell parses as an integer
    Integer,
    /// Every cell parses as a float
    Float,
    /// Anything else, kept verbatim
    Text,
}

impl ColumnKind {
    fn infer<'a>(cells: impl Iterator<Item = &'a str>) -> Self {
        let mut kind = ColumnKind::Integer;
        let mut any = false;
        for cell in cells {
            any = true;
            if kind == ColumnKind::Integer && cell.parse::<i64>().is_err() {
                kind = ColumnKind::Float;
            }
            if kind == ColumnKind::Float && cell.parse::<f64>().is_err() {
                return ColumnKind::Text;
            }
        }
        if any {
            kind
        } else {
            ColumnKind::Text
        }
    }

    fn parse(self, cell: &str) -> Value {
        match self {
            ColumnKind::Integer => cell.parse().map(Value::Int).unwrap_or_else(|_| cell.into()),
            ColumnKind::Float => cell.parse().map(Value::Float).unwrap_or_else(|_| cell.into()),
            ColumnKind::Text => cell.into(),
        }
    }
}

impl Dataset {
    /// Load a dataset from a CSV file with a header row
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, CleanError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let dataset = Self::from_csv_reader(BufReader::new(file))?;
        info!("Loaded {} rows from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Load a dataset from any CSV reader with a header row.
    ///
    /// A column is numeric only when every cell parses; a single blank cell
    /// keeps the whole column as text for the cleaner to coerce.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, CleanError> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let records = rdr.records().collect::<Result<Vec<_>, _>>()?;

        let kinds: Vec<ColumnKind> = (0..headers.len())
            .map(|col| ColumnKind::infer(records.iter().filter_map(|r| r.get(col))))
            .collect();

        let rows = records
            .iter()
            .map(|record| {
                headers
                    .iter()
                    .zip(&kinds)
                    .zip(record.iter())
                    .map(|((name, kind), cell)| (name.clone(), kind.parse(cell)))
                    .collect::<RawRecord>()
            })
            .collect();

        Ok(Dataset::from_rows(rows))
    }
}
