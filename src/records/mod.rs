//! Dengue case records
//!
//! - **types**: `Record`, `RecordFields`, `RecordDraft`, `Field`
//! - **error**: validation errors raised when a draft is coerced into fields

pub mod error;
pub mod types;

pub use error::ValidationError;
pub use types::{Field, Record, RecordDraft, RecordFields, RecordId, DATE_FORMAT};
