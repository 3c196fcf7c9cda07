//! Record validation errors

use thiserror::Error;

use super::types::Field;

/// Reasons a draft cannot become a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is blank
    #[error("{0} is required")]
    Missing(Field),

    /// A count field is not a non-negative integer
    #[error("{field} must be a whole number, got {value:?}")]
    NotANumber { field: Field, value: String },

    /// The date is not a `YYYY-MM-DD` calendar date
    #[error("date must be YYYY-MM-DD, got {0:?}")]
    InvalidDate(String),

    /// Unrecognized field name
    #[error("unknown field: {0}")]
    UnknownField(String),
}
