//! Record list
//!
//! - **manager**: the local mirror and every mutation driven from the table
//! - **filter**: search filtering and fixed-size pagination
//! - **chart**: bar/scatter dataset derivation and display options
//!
//! # Example
//!
//! ```rust,no_run
//! use dengue::list::DataListManager;
//! use dengue::store::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = DataListManager::new(Arc::new(MemoryStore::new()));
//!     manager.load().await;
//!
//!     manager.set_search("manila").await;
//!     let view = manager.page_view().await;
//!     println!("Page {} of {}", view.page, view.total_pages);
//!
//!     let charts = manager.chart_datasets().await;
//!     println!("{} bars", charts.bar.data.len());
//! }
//! ```

pub mod chart;
pub mod filter;
pub mod manager;

pub use chart::{
    derive_datasets, BarDataset, CaseLevel, ChartDatasets, ChartOptions, Rgba, ScatterDataset,
    ScatterPoint, HIGH_CASES_THRESHOLD,
};
pub use filter::{filter_records, total_pages, PageView, PAGE_SIZE};
pub use manager::{DataListManager, EditSession, ListError, ListResult, Notice, Phase};
