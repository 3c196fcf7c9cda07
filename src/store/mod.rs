//! Remote Data Store
//!
//! The authoritative record set lives in a hosted document database. This
//! module defines the contract the rest of the crate relies on and two
//! implementations:
//!
//! - **firestore**: Cloud Firestore over its REST API
//! - **memory**: an in-process store for local sessions and tests
//!
//! All four operations are independent and fallible. There is no
//! transactional grouping and no retry.

mod firestore;
mod memory;

pub use firestore::{FirestoreConfig, FirestoreStore};
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::records::{Record, RecordFields, RecordId};

/// Create/read/update/delete over the record collection
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Human-readable name for logs
    fn name(&self) -> &str;

    /// Read every record in the collection
    async fn list_all(&self) -> StoreResult<Vec<Record>>;

    /// Create a record and return its store-assigned id
    async fn create(&self, fields: &RecordFields) -> StoreResult<RecordId>;

    /// Overwrite all fields of an existing record
    async fn update(&self, id: &RecordId, fields: &RecordFields) -> StoreResult<()>;

    /// Remove an existing record
    async fn delete(&self, id: &RecordId) -> StoreResult<()>;
}

/// Errors reported by a record store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable")]
    Unavailable,

    #[error("request timeout")]
    Timeout,

    #[error("record not found: {0}")]
    NotFound(RecordId),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("could not decode document: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
