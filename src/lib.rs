//! # Dengue
//!
//! Dengue case tracker - record, search, edit, bulk-import and chart dengue
//! case counts held in a hosted document database.
//!
//! ## Features
//!
//! - **Record form**: validated creation of one record at a time
//! - **Bulk import**: CSV rows to records, each created independently
//! - **Data list**: search, fixed-size pages, inline edit and delete
//! - **Charts**: cases by location and cases against deaths
//!
//! ## Modules
//!
//! - [`records`]: record types and draft validation
//! - [`store`]: the remote store contract, Firestore and in-memory backends
//! - [`list`]: the Data List Manager, filtering, pagination and charts
//! - [`form`]: the record creation form
//! - [`import`]: CSV parsing and bulk creation
//! - [`console`]: the interactive terminal front-end
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dengue::list::DataListManager;
//! use dengue::records::{Field, RecordDraft};
//! use dengue::store::{MemoryStore, RecordStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!
//!     let fields = RecordDraft::new()
//!         .with(Field::Location, "Manila")
//!         .with(Field::Cases, "150")
//!         .with(Field::Deaths, "2")
//!         .with(Field::Date, "2023-01-01")
//!         .with(Field::Regions, "NCR")
//!         .validate()?;
//!     store.create(&fields).await?;
//!
//!     let manager = DataListManager::new(store);
//!     manager.load().await;
//!     println!("{} records", manager.records().await.len());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod console;
pub mod form;
pub mod import;
pub mod list;
pub mod records;
pub mod store;

// Re-export top-level types for convenience
pub use config::{Backend, Config, ConfigError, ImportConfig, LoggingConfig, StoreConfig};

pub use console::Console;

pub use form::{FormError, RecordForm};

pub use import::{BulkImporter, CsvImporter, CsvParseResult, ImportError, ImportReport};

pub use list::{
    derive_datasets, ChartDatasets, ChartOptions, DataListManager, ListError, Notice, PageView,
    PAGE_SIZE,
};

pub use records::{Field, Record, RecordDraft, RecordFields, RecordId, ValidationError};

pub use store::{FirestoreConfig, FirestoreStore, MemoryStore, RecordStore, StoreError, StoreResult};
