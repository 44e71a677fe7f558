//! Record Cleaning
//!
//! Provides the raw customer record model, CSV loading for training data,
//! and the cleaning stage that coerces the charge column and strips identifiers.

mod cleaner;
mod error;
mod loader;
mod record;

pub use cleaner::{Cleaner, CleanerConfig};
pub use error::CleanError;
pub use loader::ColumnKind;
pub use record::{Dataset, RawRecord, Value};
