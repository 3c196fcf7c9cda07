//! Data List Manager
//!
//! Owns the session's local mirror of the record collection and every
//! mutation the user drives through the table:
//!
//! ```text
//! Loading --load()--> Ready --begin_edit()--> Editing
//!                       ^                        |
//!                       +--- commit_edit() ------+  (store update, patch mirror)
//!                       +--- cancel_edit() ------+  (no store call)
//! ```
//!
//! The mirror is read from the store once and afterwards patched only when a
//! write issued here succeeds. Writes to the same record id are serialized;
//! writes to different ids overlap freely. The state lock is never held
//! across a store call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, RwLock};

use super::chart::{derive_datasets, ChartDatasets};
use super::filter::{filter_records, page_slice, total_pages, PageView};
use crate::records::{Field, Record, RecordDraft, RecordId, ValidationError};
use crate::store::{RecordStore, StoreError};

pub const UPDATE_SUCCESS: &str = "Data updated successfully!";
pub const UPDATE_FAILURE: &str = "Failed to update data. Please try again.";
pub const DELETE_SUCCESS: &str = "Data deleted successfully!";
pub const DELETE_FAILURE: &str = "Failed to delete data. Please try again.";

/// Lifecycle phase of the mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Initial read not finished
    Loading,
    Ready,
}

/// Last message for the user, shown once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Alert(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Alert(m) => m,
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, Notice::Alert(_))
    }
}

/// The record being edited and its text-typed draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub id: RecordId,
    pub draft: RecordDraft,
}

/// Errors from list operations
#[derive(Error, Debug)]
pub enum ListError {
    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    #[error("no record is being edited")]
    NotEditing,

    #[error("invalid record: {0}")]
    Validation(#[from] ValidationError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type ListResult<T> = Result<T, ListError>;

#[derive(Debug)]
struct ListState {
    records: Vec<Record>,
    phase: Phase,
    search: String,
    page: usize,
    editing: Option<EditSession>,
    notice: Option<Notice>,
}

impl ListState {
    fn filtered(&self) -> Vec<&Record> {
        filter_records(&self.records, &self.search)
    }
}

/// Decrements the in-flight counter when a store call finishes
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn start(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

type RecordLocks = Mutex<HashMap<RecordId, Arc<AsyncMutex<()>>>>;

/// Local mirror of the record collection plus the table's UI state
pub struct DataListManager<S: ?Sized> {
    store: Arc<S>,
    state: Arc<RwLock<ListState>>,
    record_locks: Arc<RecordLocks>,
    in_flight: Arc<AtomicUsize>,
}

impl<S: ?Sized> Clone for DataListManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            state: Arc::clone(&self.state),
            record_locks: Arc::clone(&self.record_locks),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<S: RecordStore + ?Sized> DataListManager<S> {
    /// Create a manager in the `Loading` phase; call [`load`](Self::load) next
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            state: Arc::new(RwLock::new(ListState {
                records: Vec::new(),
                phase: Phase::Loading,
                search: String::new(),
                page: 1,
                editing: None,
                notice: None,
            })),
            record_locks: Arc::new(Mutex::new(HashMap::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // ============================================
    // Loading
    // ============================================

    /// Read the whole collection into the mirror.
    ///
    /// A read failure is logged and leaves the mirror empty; it is not
    /// surfaced to the user and not retried. Returns the number of records
    /// loaded.
    pub async fn load(&self) -> usize {
        self.state.write().await.phase = Phase::Loading;

        let result = self.store.list_all().await;

        let mut state = self.state.write().await;
        state.phase = Phase::Ready;
        match result {
            Ok(records) => {
                let count = records.len();
                state.records = records;
                tracing::info!(store = self.store.name(), count, "Loaded records");
                count
            }
            Err(e) => {
                state.records.clear();
                tracing::error!(store = self.store.name(), error = %e, "Error fetching records");
                0
            }
        }
    }

    /// Re-read the collection, replacing the mirror on success.
    ///
    /// On failure the current mirror is kept.
    pub async fn refresh(&self) -> ListResult<usize> {
        let result = {
            let _busy = InFlight::start(&self.in_flight);
            self.store.list_all().await
        };

        match result {
            Ok(records) => {
                let count = records.len();
                let mut state = self.state.write().await;
                state.records = records;
                state.phase = Phase::Ready;
                tracing::info!(store = self.store.name(), count, "Refreshed records");
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(store = self.store.name(), error = %e, "Refresh failed, keeping cached records");
                Err(e.into())
            }
        }
    }

    pub async fn phase(&self) -> Phase {
        self.state.read().await.phase
    }

    /// True while the initial read or any store call is pending
    pub async fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0 || self.phase().await == Phase::Loading
    }

    /// Snapshot of the mirror in store order
    pub async fn records(&self) -> Vec<Record> {
        self.state.read().await.records.clone()
    }

    pub async fn get(&self, id: &RecordId) -> Option<Record> {
        self.state
            .read()
            .await
            .records
            .iter()
            .find(|r| &r.id == id)
            .cloned()
    }

    // ============================================
    // Search and pagination
    // ============================================

    /// Set the search term. The page index is left as it is.
    pub async fn set_search(&self, term: impl Into<String>) {
        self.state.write().await.search = term.into();
    }

    pub async fn search(&self) -> String {
        self.state.read().await.search.clone()
    }

    /// Records matching the current search, in mirror order
    pub async fn filtered(&self) -> Vec<Record> {
        self.state
            .read()
            .await
            .filtered()
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn total_pages(&self) -> usize {
        total_pages(self.state.read().await.filtered().len())
    }

    pub async fn current_page(&self) -> usize {
        self.state.read().await.page
    }

    /// Move to `page` if it lies within `[1, total_pages]`.
    ///
    /// Returns whether the page changed.
    pub async fn go_to_page(&self, page: usize) -> bool {
        let mut state = self.state.write().await;
        let total = total_pages(state.filtered().len());
        if page >= 1 && page <= total {
            state.page = page;
            true
        } else {
            false
        }
    }

    pub async fn next_page(&self) -> bool {
        let page = self.current_page().await;
        self.go_to_page(page + 1).await
    }

    pub async fn previous_page(&self) -> bool {
        let page = self.current_page().await;
        match page.checked_sub(1) {
            Some(previous) => self.go_to_page(previous).await,
            None => false,
        }
    }

    /// The current page of the filtered set
    pub async fn page_view(&self) -> PageView {
        let state = self.state.read().await;
        let filtered = state.filtered();
        PageView {
            records: page_slice(&filtered, state.page)
                .iter()
                .map(|r| (*r).clone())
                .collect(),
            page: state.page,
            total_pages: total_pages(filtered.len()),
            total_matches: filtered.len(),
        }
    }

    /// Bar and scatter datasets for the filtered set
    pub async fn chart_datasets(&self) -> ChartDatasets {
        let state = self.state.read().await;
        derive_datasets(state.filtered())
    }

    // ============================================
    // Editing
    // ============================================

    /// Start editing `id`, replacing any draft already open
    pub async fn begin_edit(&self, id: &RecordId) -> ListResult<()> {
        let mut state = self.state.write().await;
        let record = state
            .records
            .iter()
            .find(|r| &r.id == id)
            .ok_or_else(|| ListError::RecordNotFound(id.clone()))?;

        let draft = RecordDraft::from_fields(&record.fields);
        if let Some(previous) = state.editing.replace(EditSession {
            id: id.clone(),
            draft,
        }) {
            if &previous.id != id {
                tracing::debug!(discarded = %previous.id, "Replaced open edit draft");
            }
        }
        Ok(())
    }

    /// Change one field of the open draft
    pub async fn edit_field(&self, field: Field, value: impl Into<String>) -> ListResult<()> {
        let mut state = self.state.write().await;
        let session = state.editing.as_mut().ok_or(ListError::NotEditing)?;
        session.draft.set(field, value);
        Ok(())
    }

    pub async fn editing(&self) -> Option<EditSession> {
        self.state.read().await.editing.clone()
    }

    /// Discard the open draft without touching the store.
    ///
    /// Returns whether a draft was open.
    pub async fn cancel_edit(&self) -> bool {
        self.state.write().await.editing.take().is_some()
    }

    /// Validate the open draft and write it to the store.
    ///
    /// On success the mirror entry is replaced in place and edit mode ends.
    /// On any failure edit mode stays open so the user can retry.
    pub async fn commit_edit(&self) -> ListResult<Record> {
        let session = self
            .state
            .read()
            .await
            .editing
            .clone()
            .ok_or(ListError::NotEditing)?;

        let fields = match session.draft.validate() {
            Ok(fields) => fields,
            Err(e) => {
                self.set_notice(Notice::Alert(e.to_string())).await;
                return Err(e.into());
            }
        };

        let lock = self.record_lock(&session.id);
        let result = {
            let _serial = lock.lock().await;
            let _busy = InFlight::start(&self.in_flight);
            self.store.update(&session.id, &fields).await
        };
        self.release_record_lock(&session.id, lock);

        let mut state = self.state.write().await;
        match result {
            Ok(()) => {
                let record = Record::new(session.id.clone(), fields);
                if let Some(slot) = state.records.iter_mut().find(|r| r.id == session.id) {
                    *slot = record.clone();
                }
                // A draft reopened or changed while the update was pending stays open
                if state.editing.as_ref() == Some(&session) {
                    state.editing = None;
                }
                state.notice = Some(Notice::Success(UPDATE_SUCCESS.to_string()));
                tracing::info!(id = %session.id, "Updated record");
                Ok(record)
            }
            Err(e) => {
                state.notice = Some(Notice::Alert(UPDATE_FAILURE.to_string()));
                tracing::error!(id = %session.id, error = %e, "Error updating record");
                Err(e.into())
            }
        }
    }

    // ============================================
    // Deleting
    // ============================================

    /// Delete `id` from the store, then from the mirror.
    ///
    /// On failure the mirror is unchanged.
    pub async fn delete(&self, id: &RecordId) -> ListResult<()> {
        let lock = self.record_lock(id);
        let result = {
            let _serial = lock.lock().await;
            let _busy = InFlight::start(&self.in_flight);
            self.store.delete(id).await
        };
        self.release_record_lock(id, lock);

        let mut state = self.state.write().await;
        match result {
            Ok(()) => {
                state.records.retain(|r| &r.id != id);
                if state.editing.as_ref().map(|e| &e.id) == Some(id) {
                    state.editing = None;
                }
                state.notice = Some(Notice::Success(DELETE_SUCCESS.to_string()));
                tracing::info!(id = %id, "Deleted record");
                Ok(())
            }
            Err(e) => {
                state.notice = Some(Notice::Alert(DELETE_FAILURE.to_string()));
                tracing::error!(id = %id, error = %e, "Error deleting record");
                Err(e.into())
            }
        }
    }

    // ============================================
    // Notices
    // ============================================

    /// Take the pending notice, if any
    pub async fn take_notice(&self) -> Option<Notice> {
        self.state.write().await.notice.take()
    }

    async fn set_notice(&self, notice: Notice) {
        self.state.write().await.notice = Some(notice);
    }

    // ============================================
    // Per-record serialization
    // ============================================

    fn record_lock(&self, id: &RecordId) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .record_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id.clone()).or_default())
    }

    /// Drop the lock entry once no other mutation of `id` holds or awaits it
    fn release_record_lock(&self, id: &RecordId, lock: Arc<AsyncMutex<()>>) {
        let mut locks = self
            .record_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one held here
        if Arc::strong_count(&lock) == 2 {
            locks.remove(id);
        }
    }
}
