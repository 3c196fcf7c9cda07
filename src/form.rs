//! Record Form
//!
//! Collects one new record as text, validates it, and submits a single
//! create request. The form never touches the list mirror.

use std::sync::Arc;
use thiserror::Error;

use crate::list::Notice;
use crate::records::{Field, RecordDraft, RecordId, ValidationError};
use crate::store::{RecordStore, StoreError};

pub const ADD_SUCCESS: &str = "Data added successfully!";
pub const ADD_FAILURE: &str = "Failed to add data. Please try again.";

/// Errors from submitting the form
#[derive(Error, Debug)]
pub enum FormError {
    #[error("invalid record: {0}")]
    Validation(#[from] ValidationError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Creation form over a record store
pub struct RecordForm<S: ?Sized> {
    store: Arc<S>,
    draft: RecordDraft,
    submitting: bool,
    error: Option<String>,
    notice: Option<Notice>,
}

impl<S: RecordStore + ?Sized> RecordForm<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            draft: RecordDraft::new(),
            submitting: false,
            error: None,
            notice: None,
        }
    }

    pub fn draft(&self) -> &RecordDraft {
        &self.draft
    }

    /// Update exactly one field of the draft
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.draft.set(field, value);
    }

    /// Whether the submit control is disabled
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Error text shown above the form
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Validate the draft and create the record.
    ///
    /// On success the draft is cleared. A store failure keeps the draft and
    /// sets a generic error message. The submitting flag is always cleared
    /// before returning.
    pub async fn submit(&mut self) -> Result<RecordId, FormError> {
        self.submitting = true;
        self.error = None;

        let result = self.create().await;

        match &result {
            Ok(id) => {
                tracing::info!(id = %id, "Added record");
                self.draft = RecordDraft::new();
                self.notice = Some(Notice::Success(ADD_SUCCESS.to_string()));
            }
            Err(FormError::Validation(e)) => {
                self.error = Some(e.to_string());
            }
            Err(e) => {
                tracing::error!(error = %e, "Error adding record");
                self.error = Some(ADD_FAILURE.to_string());
            }
        }

        self.submitting = false;
        result
    }

    async fn create(&self) -> Result<RecordId, FormError> {
        let fields = self.draft.validate()?;
        Ok(self.store.create(&fields).await?)
    }
}
