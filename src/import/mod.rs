//! Bulk import
//!
//! CSV rows map one-to-one onto records. Every row is validated before any
//! write, and valid rows are created independently of one another.

mod csv_import;

pub use csv_import::{
    BulkImporter, ColumnMap, CsvImporter, CsvParseResult, ErrorLog, ImportReport, ParsedRow,
};

/// Errors that abort an import as a whole
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
}
