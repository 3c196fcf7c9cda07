//! Core record types
//!
//! - `Record`: a store-assigned id plus its field set
//! - `RecordFields`: the five persisted fields, numbers as numbers
//! - `RecordDraft`: text-typed form state, validated into `RecordFields`
//! - `Field`: names one of the five fields

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ValidationError;

/// Date format used for storage and the form's date input
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Opaque identifier assigned by the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The persisted field set of a record
///
/// Counts are `None` only for documents written outside this application
/// whose numeric field is missing or not a number. Validated writes always
/// carry both counts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordFields {
    pub location: String,
    pub cases: Option<u64>,
    pub deaths: Option<u64>,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    pub regions: String,
}

impl RecordFields {
    pub fn new(
        location: impl Into<String>,
        cases: u64,
        deaths: u64,
        date: impl Into<String>,
        regions: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            cases: Some(cases),
            deaths: Some(deaths),
            date: date.into(),
            regions: regions.into(),
        }
    }
}

/// A record as held in the local mirror
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: RecordFields,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, fields: RecordFields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Case-insensitive substring match on location or regions.
    ///
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        self.fields.location.to_lowercase().contains(needle)
            || self.fields.regions.to_lowercase().contains(needle)
    }
}

/// One of the five editable fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Location,
    Cases,
    Deaths,
    Date,
    Regions,
}

impl Field {
    /// All fields in form order
    pub fn all() -> &'static [Field] {
        &[
            Field::Location,
            Field::Cases,
            Field::Deaths,
            Field::Date,
            Field::Regions,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Field::Location => "location",
            Field::Cases => "cases",
            Field::Deaths => "deaths",
            Field::Date => "date",
            Field::Regions => "regions",
        }
    }

    /// Placeholder shown by the form
    pub fn label(&self) -> &'static str {
        match self {
            Field::Location => "Location",
            Field::Cases => "Cases",
            Field::Deaths => "Deaths",
            Field::Date => "Date",
            Field::Regions => "Regions",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "location" => Ok(Field::Location),
            "cases" => Ok(Field::Cases),
            "deaths" => Ok(Field::Deaths),
            "date" => Ok(Field::Date),
            "regions" | "region" => Ok(Field::Regions),
            other => Err(ValidationError::UnknownField(other.to_string())),
        }
    }
}

/// Text-typed draft of a record, as held by a form
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordDraft {
    pub location: String,
    pub cases: String,
    pub deaths: String,
    pub date: String,
    pub regions: String,
}

impl RecordDraft {
    /// An empty draft
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy a record's current fields into a draft
    pub fn from_fields(fields: &RecordFields) -> Self {
        Self {
            location: fields.location.clone(),
            cases: fields.cases.map(|c| c.to_string()).unwrap_or_default(),
            deaths: fields.deaths.map(|d| d.to_string()).unwrap_or_default(),
            date: fields.date.clone(),
            regions: fields.regions.clone(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Location => &self.location,
            Field::Cases => &self.cases,
            Field::Deaths => &self.deaths,
            Field::Date => &self.date,
            Field::Regions => &self.regions,
        }
    }

    /// Replace exactly one field
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Location => self.location = value,
            Field::Cases => self.cases = value,
            Field::Deaths => self.deaths = value,
            Field::Date => self.date = value,
            Field::Regions => self.regions = value,
        }
    }

    /// Builder method: set one field
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validate and coerce into typed fields.
    ///
    /// Text fields are trimmed; counts must parse as non-negative integers;
    /// the date must be a real `YYYY-MM-DD` calendar date.
    pub fn validate(&self) -> Result<RecordFields, ValidationError> {
        let location = required(Field::Location, &self.location)?;
        let cases = parse_count(Field::Cases, &self.cases)?;
        let deaths = parse_count(Field::Deaths, &self.deaths)?;
        let date = required(Field::Date, &self.date)?;
        // Stored zero-padded even when entered as e.g. "2023-1-5"
        let date = NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|_| ValidationError::InvalidDate(date.to_string()))?
            .format(DATE_FORMAT)
            .to_string();
        let regions = required(Field::Regions, &self.regions)?;

        Ok(RecordFields::new(location, cases, deaths, date, regions))
    }
}

fn required(field: Field, value: &str) -> Result<&str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::Missing(field))
    } else {
        Ok(value)
    }
}

fn parse_count(field: Field, value: &str) -> Result<u64, ValidationError> {
    let value = required(field, value)?;
    value.parse::<u64>().map_err(|_| ValidationError::NotANumber {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manila_draft() -> RecordDraft {
        RecordDraft::new()
            .with(Field::Location, "Manila")
            .with(Field::Cases, "150")
            .with(Field::Deaths, "2")
            .with(Field::Date, "2023-01-01")
            .with(Field::Regions, "NCR")
    }

    #[test]
    fn test_validate_coerces_numbers() {
        let fields = manila_draft().validate().unwrap();
        assert_eq!(fields.cases, Some(150));
        assert_eq!(fields.deaths, Some(2));
        assert_eq!(fields.location, "Manila");
    }

    #[test]
    fn test_validate_trims_whitespace() {
        let fields = manila_draft()
            .with(Field::Cases, " 50 ")
            .with(Field::Location, "  Cebu ")
            .validate()
            .unwrap();
        assert_eq!(fields.cases, Some(50));
        assert_eq!(fields.location, "Cebu");
    }

    #[test]
    fn test_validate_rejects_non_numeric() {
        let err = manila_draft().with(Field::Deaths, "two").validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotANumber {
                field: Field::Deaths,
                value: "two".to_string()
            }
        );

        let err = manila_draft().with(Field::Cases, "-3").validate().unwrap_err();
        assert!(matches!(err, ValidationError::NotANumber { field: Field::Cases, .. }));
    }

    #[test]
    fn test_validate_rejects_missing_and_bad_date() {
        let err = manila_draft().with(Field::Regions, "   ").validate().unwrap_err();
        assert_eq!(err, ValidationError::Missing(Field::Regions));

        let err = manila_draft().with(Field::Date, "2023-02-30").validate().unwrap_err();
        assert_eq!(err, ValidationError::InvalidDate("2023-02-30".to_string()));
    }

    #[test]
    fn test_validate_pads_date() {
        let fields = manila_draft()
            .with(Field::Date, " 2023-1-5 ")
            .validate()
            .unwrap();
        assert_eq!(fields.date, "2023-01-05");
    }

    #[test]
    fn test_set_changes_exactly_one_field() {
        let mut draft = manila_draft();
        draft.set(Field::Regions, "Region VII");
        assert_eq!(draft.regions, "Region VII");
        assert_eq!(draft.location, "Manila");
        assert_eq!(draft.cases, "150");
        assert_eq!(draft.date, "2023-01-01");
    }

    #[test]
    fn test_draft_from_fields_with_absent_counts() {
        let fields = RecordFields {
            location: "Davao".to_string(),
            cases: None,
            deaths: Some(1),
            date: "2023-03-01".to_string(),
            regions: "XI".to_string(),
        };
        let draft = RecordDraft::from_fields(&fields);
        assert_eq!(draft.cases, "");
        assert_eq!(draft.deaths, "1");
    }

    #[test]
    fn test_field_parsing() {
        assert_eq!("Cases".parse::<Field>().unwrap(), Field::Cases);
        assert_eq!("region".parse::<Field>().unwrap(), Field::Regions);
        assert!("province".parse::<Field>().is_err());
    }

    #[test]
    fn test_record_matches_is_case_insensitive() {
        let record = Record::new("1", manila_draft().validate().unwrap());
        assert!(record.matches("manila"));
        assert!(record.matches("ncr"));
        assert!(!record.matches("cebu"));
    }
}
