//! CSV Import
//!
//! Parses dengue case rows from CSV and submits them to a record store.
//! Columns are found by header name, so order does not matter and extra
//! columns are ignored.

use chrono::NaiveDate;
use futures_util::stream::{self, StreamExt};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use super::ImportError;
use crate::records::{Field, RecordDraft, RecordFields, RecordId, DATE_FORMAT};
use crate::store::RecordStore;

/// Error messages kept before truncating
const MAX_ERRORS: usize = 100;

/// Column positions of the five fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    location: usize,
    cases: usize,
    deaths: usize,
    date: usize,
    regions: usize,
}

impl ColumnMap {
    /// Detect columns from the header row (case-insensitive)
    pub fn detect(headers: &csv::StringRecord) -> Result<Self, ImportError> {
        let find = |field: Field| -> Result<usize, ImportError> {
            headers
                .iter()
                .position(|h| h.trim().parse::<Field>().ok() == Some(field))
                .ok_or(ImportError::MissingColumn(field.name()))
        };

        Ok(Self {
            location: find(Field::Location)?,
            cases: find(Field::Cases)?,
            deaths: find(Field::Deaths)?,
            date: find(Field::Date)?,
            regions: find(Field::Regions)?,
        })
    }

    pub fn index(&self, field: Field) -> usize {
        match field {
            Field::Location => self.location,
            Field::Cases => self.cases,
            Field::Deaths => self.deaths,
            Field::Date => self.date,
            Field::Regions => self.regions,
        }
    }
}

/// A validated row with its line number in the source file
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub line: usize,
    pub fields: RecordFields,
}

/// Line-numbered error messages, capped at `MAX_ERRORS`.
///
/// Messages past the cap are only counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLog {
    messages: Vec<String>,
    omitted: usize,
}

impl ErrorLog {
    pub fn push(&mut self, line: usize, reason: impl std::fmt::Display) {
        if self.messages.len() < MAX_ERRORS {
            self.messages.push(format!("Line {}: {}", line, reason));
        } else {
            self.omitted += 1;
        }
    }

    /// Kept messages, in the order they were pushed
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Number of messages dropped past the cap
    pub fn omitted(&self) -> usize {
        self.omitted
    }

    pub fn total(&self) -> usize {
        self.messages.len() + self.omitted
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// `"... and K more errors"` when anything was dropped
    pub fn trailer(&self) -> Option<String> {
        (self.omitted > 0).then(|| format!("... and {} more errors", self.omitted))
    }
}

/// Result of parsing a CSV source
#[derive(Debug, Default)]
pub struct CsvParseResult {
    pub rows: Vec<ParsedRow>,
    pub rows_read: usize,
    pub rows_rejected: usize,
    pub errors: ErrorLog,
}

/// Result of submitting parsed rows to a store
#[derive(Debug, Default)]
pub struct ImportReport {
    pub rows_read: usize,
    pub rows_rejected: usize,
    pub created: Vec<RecordId>,
    pub failed: usize,
    pub errors: ErrorLog,
}

/// CSV parser producing validated record fields
pub struct CsvImporter {
    /// Accepted date formats, tried in order
    date_formats: Vec<String>,
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvImporter {
    pub fn new() -> Self {
        Self {
            date_formats: vec![
                DATE_FORMAT.to_string(),
                "%m/%d/%Y".to_string(),
                "%Y/%m/%d".to_string(),
            ],
        }
    }

    /// Replace the accepted date formats
    pub fn with_date_formats(mut self, formats: &[&str]) -> Self {
        self.date_formats = formats.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Normalize a date to `YYYY-MM-DD`, or `None` if no format matches
    fn normalize_date(&self, value: &str) -> Option<String> {
        self.date_formats.iter().find_map(|fmt| {
            NaiveDate::parse_from_str(value, fmt)
                .ok()
                .map(|d| d.format(DATE_FORMAT).to_string())
        })
    }

    /// Parse a CSV file
    pub fn parse_path(&self, path: &Path) -> Result<CsvParseResult, ImportError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;
        self.parse_reader(reader)
    }

    /// Parse CSV held in memory
    pub fn parse_str(&self, csv_data: &str) -> Result<CsvParseResult, ImportError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());
        self.parse_reader(reader)
    }

    fn parse_reader<R: Read>(&self, mut reader: csv::Reader<R>) -> Result<CsvParseResult, ImportError> {
        let columns = ColumnMap::detect(reader.headers()?)?;
        let mut result = CsvParseResult::default();

        for (line_num, row) in reader.records().enumerate() {
            // Header is line 1
            let line = line_num + 2;
            result.rows_read += 1;

            let row = match row {
                Ok(r) => r,
                Err(e) => {
                    result.errors.push(line, e);
                    result.rows_rejected += 1;
                    continue;
                }
            };

            let mut draft = RecordDraft::new();
            for field in Field::all() {
                let value = row.get(columns.index(*field)).unwrap_or_default().trim();
                draft.set(*field, value);
            }
            if let Some(date) = self.normalize_date(&draft.date) {
                draft.date = date;
            }

            match draft.validate() {
                Ok(fields) => result.rows.push(ParsedRow { line, fields }),
                Err(e) => {
                    result.errors.push(line, e);
                    result.rows_rejected += 1;
                }
            }
        }

        Ok(result)
    }
}

/// Submits parsed rows to a store with bounded concurrency
pub struct BulkImporter<S: ?Sized> {
    store: Arc<S>,
    max_concurrency: usize,
}

impl<S: RecordStore + ?Sized> BulkImporter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            max_concurrency: 8,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Create one record per parsed row.
    ///
    /// Each create is independent; failures are counted and reported by
    /// line, never retried.
    pub async fn submit(&self, parsed: CsvParseResult) -> ImportReport {
        let mut report = ImportReport {
            rows_read: parsed.rows_read,
            rows_rejected: parsed.rows_rejected,
            errors: parsed.errors,
            ..Default::default()
        };

        let outcomes: Vec<_> = stream::iter(parsed.rows)
            .map(|row| async move {
                let outcome = self.store.create(&row.fields).await;
                (row.line, outcome)
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut failures: Vec<(usize, String)> = Vec::new();
        for (line, outcome) in outcomes {
            match outcome {
                Ok(id) => report.created.push(id),
                Err(e) => {
                    tracing::warn!(line, error = %e, "Failed to import row");
                    failures.push((line, e.to_string()));
                }
            }
        }

        failures.sort_by_key(|(line, _)| *line);
        report.failed = failures.len();
        for (line, e) in failures {
            report.errors.push(line, e);
        }

        tracing::info!(
            created = report.created.len(),
            rejected = report.rows_rejected,
            failed = report.failed,
            "CSV import finished"
        );
        report
    }

    /// Parse a CSV file and submit every valid row
    pub async fn import_path(&self, importer: &CsvImporter, path: &Path) -> Result<ImportReport, ImportError> {
        let parsed = importer.parse_path(path)?;
        Ok(self.submit(parsed).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Record;
    use crate::store::{MemoryStore, StoreError, StoreResult};
    use async_trait::async_trait;
    use std::io::Write;

    /// Store that rejects every create
    struct ReadOnlyStore;

    #[async_trait]
    impl RecordStore for ReadOnlyStore {
        fn name(&self) -> &str {
            "read-only"
        }

        async fn list_all(&self) -> StoreResult<Vec<Record>> {
            Ok(Vec::new())
        }

        async fn create(&self, _fields: &RecordFields) -> StoreResult<RecordId> {
            Err(StoreError::Unavailable)
        }

        async fn update(&self, id: &RecordId, _fields: &RecordFields) -> StoreResult<()> {
            Err(StoreError::NotFound(id.clone()))
        }

        async fn delete(&self, id: &RecordId) -> StoreResult<()> {
            Err(StoreError::NotFound(id.clone()))
        }
    }

    const SAMPLE: &str = "Location,Cases,Deaths,Date,Regions
Manila,150,2,2023-01-01,NCR
Cebu,40,0,01/15/2023,Region VII
Davao,many,1,2023-01-03,Region XI
Iloilo,12,0,2023-13-01,Region VI";

    #[test]
    fn test_parse_valid_and_invalid_rows() {
        let result = CsvImporter::new().parse_str(SAMPLE).unwrap();

        assert_eq!(result.rows_read, 4);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows_rejected, 2);
        assert_eq!(
            result.rows[0].fields,
            RecordFields::new("Manila", 150, 2, "2023-01-01", "NCR")
        );
        assert_eq!(result.rows[1].fields.date, "2023-01-15");
        assert_eq!(result.rows[1].line, 3);
        assert!(result.errors.messages()[0].starts_with("Line 4: cases"));
        assert!(result.errors.messages()[1].starts_with("Line 5: date"));
        assert!(result.errors.trailer().is_none());
    }

    #[test]
    fn test_columns_in_any_order() {
        let csv_data = "date,region,notes,deaths,cases,location
2023-03-01,CAR,ignored,0,5,Baguio";
        let result = CsvImporter::new().parse_str(csv_data).unwrap();
        assert_eq!(
            result.rows[0].fields,
            RecordFields::new("Baguio", 5, 0, "2023-03-01", "CAR")
        );
    }

    #[test]
    fn test_missing_column_fails_whole_import() {
        let csv_data = "location,cases,date,regions\nManila,1,2023-01-01,NCR";
        let err = CsvImporter::new().parse_str(csv_data).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn("deaths")));
    }

    #[test]
    fn test_error_list_is_truncated() {
        let mut csv_data = String::from("location,cases,deaths,date,regions\n");
        for _ in 0..150 {
            csv_data.push_str("X,bad,0,2023-01-01,R\n");
        }
        let result = CsvImporter::new().parse_str(&csv_data).unwrap();
        assert_eq!(result.rows_rejected, 150);
        assert_eq!(result.errors.messages().len(), MAX_ERRORS);
        assert_eq!(result.errors.omitted(), 50);
        assert_eq!(result.errors.trailer().unwrap(), "... and 50 more errors");
    }

    #[test]
    fn test_custom_date_formats() {
        let csv_data = "location,cases,deaths,date,regions\nManila,1,0,01/02/2023,NCR";
        let result = CsvImporter::new()
            .with_date_formats(&["%d/%m/%Y"])
            .parse_str(csv_data)
            .unwrap();
        assert_eq!(result.rows[0].fields.date, "2023-02-01");
    }

    #[tokio::test]
    async fn test_submit_creates_records() {
        let store = Arc::new(MemoryStore::new());
        let parsed = CsvImporter::new().parse_str(SAMPLE).unwrap();

        let report = BulkImporter::new(Arc::clone(&store))
            .with_max_concurrency(2)
            .submit(parsed)
            .await;

        assert_eq!(report.created.len(), 2);
        assert_eq!(report.failed, 0);
        assert_eq!(report.rows_rejected, 2);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_import_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let store = Arc::new(MemoryStore::new());
        let report = BulkImporter::new(Arc::clone(&store))
            .import_path(&CsvImporter::new(), file.path())
            .await
            .unwrap();

        assert_eq!(report.rows_read, 4);
        assert_eq!(report.created.len(), 2);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_create_failures_count_past_parse_cap() {
        let mut csv_data = String::from("location,cases,deaths,date,regions\n");
        for _ in 0..150 {
            csv_data.push_str("X,bad,0,2023-01-01,R\n");
        }
        for _ in 0..5 {
            csv_data.push_str("Manila,1,0,2023-01-01,NCR\n");
        }
        let parsed = CsvImporter::new().parse_str(&csv_data).unwrap();

        let report = BulkImporter::new(Arc::new(ReadOnlyStore)).submit(parsed).await;

        assert_eq!(report.rows_rejected, 150);
        assert_eq!(report.failed, 5);
        assert_eq!(report.errors.messages().len(), MAX_ERRORS);
        assert_eq!(report.errors.total(), 155);
        assert_eq!(report.errors.trailer().unwrap(), "... and 55 more errors");
    }

    #[tokio::test]
    async fn test_create_failures_listed_by_line() {
        let parsed = CsvImporter::new().parse_str(SAMPLE).unwrap();
        let report = BulkImporter::new(Arc::new(ReadOnlyStore)).submit(parsed).await;

        let messages = report.errors.messages();
        assert_eq!(messages.len(), 4);
        assert!(messages[2].starts_with("Line 2: store unavailable"));
        assert!(messages[3].starts_with("Line 3: store unavailable"));
        assert!(report.errors.trailer().is_none());
    }
}
