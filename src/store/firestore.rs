//! Cloud Firestore REST client
//!
//! Talks to the Firestore v1 REST API for a single collection. Documents use
//! Firestore's typed value encoding (`stringValue`, `integerValue`, ...).

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::{RecordStore, StoreError, StoreResult};
use crate::records::{Record, RecordFields, RecordId};

/// Field paths written on every update
const FIELD_PATHS: [&str; 5] = ["location", "cases", "deaths", "date", "regions"];

/// Configuration for the Firestore client
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// REST endpoint (e.g., "https://firestore.googleapis.com/v1")
    pub base_url: String,
    /// Google Cloud project id
    pub project_id: String,
    /// Database id ("(default)" for most projects)
    pub database: String,
    /// Collection holding the records
    pub collection: String,
    /// Web API key, appended as `key=`
    pub api_key: Option<String>,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Documents requested per list page
    pub page_size: u32,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://firestore.googleapis.com/v1".to_string(),
            project_id: String::new(),
            database: "(default)".to_string(),
            collection: "dengueData".to_string(),
            api_key: None,
            request_timeout_ms: 10_000,
            page_size: 300,
        }
    }
}

/// Record store backed by a Firestore collection
pub struct FirestoreStore {
    client: Client,
    config: FirestoreConfig,
}

impl FirestoreStore {
    pub fn new(config: FirestoreConfig) -> StoreResult<Self> {
        if config.project_id.trim().is_empty() {
            return Err(StoreError::Config("project_id is not set".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.project_id,
            self.config.database,
            self.config.collection
        )
    }

    fn document_url(&self, id: &RecordId) -> String {
        format!(
            "{}/{}",
            self.collection_url(),
            urlencoding::encode(id.as_str())
        )
    }

    fn with_key(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) if !key.is_empty() => request.query(&[("key", key.as_str())]),
            _ => request,
        }
    }

    async fn send(&self, request: RequestBuilder, id: Option<&RecordId>) -> StoreResult<Response> {
        let response = self.with_key(request).send().await.map_err(map_request_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(failure_error(status.as_u16(), message, id))
    }
}

#[async_trait]
impl RecordStore for FirestoreStore {
    fn name(&self) -> &str {
        "firestore"
    }

    async fn list_all(&self) -> StoreResult<Vec<Record>> {
        let url = self.collection_url();
        let page_size = self.config.page_size.to_string();
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .query(&[("pageSize", page_size.as_str())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: ListResponse = self.send(request, None).await?.json().await?;
            for document in page.documents {
                records.push(decode_document(&document)?);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(count = records.len(), "Listed Firestore documents");
        Ok(records)
    }

    async fn create(&self, fields: &RecordFields) -> StoreResult<RecordId> {
        let request = self
            .client
            .post(self.collection_url())
            .json(&json!({ "fields": encode_fields(fields) }));

        let document: Document = self.send(request, None).await?.json().await?;
        let id = document_id(&document.name)?;
        tracing::debug!(id = %id, "Created Firestore document");
        Ok(id)
    }

    async fn update(&self, id: &RecordId, fields: &RecordFields) -> StoreResult<()> {
        let mut params: Vec<(&str, &str)> = FIELD_PATHS
            .iter()
            .map(|path| ("updateMask.fieldPaths", *path))
            .collect();
        params.push(("currentDocument.exists", "true"));

        let request = self
            .client
            .patch(self.document_url(id))
            .query(&params)
            .json(&json!({ "fields": encode_fields(fields) }));

        self.send(request, Some(id)).await?;
        tracing::debug!(id = %id, "Updated Firestore document");
        Ok(())
    }

    async fn delete(&self, id: &RecordId) -> StoreResult<()> {
        let request = self
            .client
            .delete(self.document_url(id))
            .query(&[("currentDocument.exists", "true")]);

        self.send(request, Some(id)).await?;
        tracing::debug!(id = %id, "Deleted Firestore document");
        Ok(())
    }
}

fn map_request_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout
    } else if e.is_connect() {
        StoreError::Unavailable
    } else {
        StoreError::Request(e)
    }
}

/// Error for a non-success response.
///
/// Firestore reports failed preconditions on missing documents as 404 or
/// 400 FAILED_PRECONDITION depending on the operation. Either means the
/// targeted document does not exist.
fn failure_error(status: u16, message: String, id: Option<&RecordId>) -> StoreError {
    match id {
        Some(id) if status == 404 || message.contains("FAILED_PRECONDITION") => {
            StoreError::NotFound(id.clone())
        }
        _ => StoreError::Api { status, message },
    }
}

// ============================================
// Document encoding
// ============================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

/// Encode fields as a Firestore `fields` map
fn encode_fields(fields: &RecordFields) -> Value {
    let mut map = Map::new();
    map.insert("location".into(), json!({ "stringValue": fields.location }));
    map.insert("cases".into(), encode_count(fields.cases));
    map.insert("deaths".into(), encode_count(fields.deaths));
    map.insert("date".into(), json!({ "stringValue": fields.date }));
    map.insert("regions".into(), json!({ "stringValue": fields.regions }));
    Value::Object(map)
}

fn encode_count(count: Option<u64>) -> Value {
    match count {
        // integerValue is an int64 carried as a JSON string
        Some(n) => json!({ "integerValue": n.to_string() }),
        None => json!({ "nullValue": null }),
    }
}

fn decode_document(document: &Document) -> StoreResult<Record> {
    let id = document_id(&document.name)?;
    let fields = RecordFields {
        location: decode_string(document.fields.get("location")),
        cases: decode_count(document.fields.get("cases")),
        deaths: decode_count(document.fields.get("deaths")),
        date: decode_string(document.fields.get("date")),
        regions: decode_string(document.fields.get("regions")),
    };
    Ok(Record::new(id, fields))
}

/// The document id is the last segment of its resource name
fn document_id(name: &str) -> StoreResult<RecordId> {
    match name.rsplit('/').next() {
        Some(id) if !id.is_empty() => Ok(RecordId::new(id)),
        _ => Err(StoreError::Decode(format!("invalid document name: {name:?}"))),
    }
}

fn decode_string(value: Option<&Value>) -> String {
    let Some(value) = value else {
        return String::new();
    };

    if let Some(s) = value.get("stringValue").and_then(Value::as_str) {
        s.to_string()
    } else if let Some(s) = value.get("integerValue").and_then(Value::as_str) {
        s.to_string()
    } else if let Some(n) = value.get("doubleValue").and_then(Value::as_f64) {
        n.to_string()
    } else if let Some(ts) = value.get("timestampValue").and_then(Value::as_str) {
        // Keep only the calendar date
        ts.split('T').next().unwrap_or_default().to_string()
    } else {
        String::new()
    }
}

/// Decode a count, leaving it absent when missing or not a whole number.
///
/// Older documents were written with text-typed counts, so numeric strings
/// are accepted too.
fn decode_count(value: Option<&Value>) -> Option<u64> {
    let value = value?;

    if let Some(n) = value.get("integerValue") {
        return match n {
            Value::String(s) => s.parse().ok(),
            other => other.as_u64(),
        };
    }
    if let Some(n) = value.get("doubleValue").and_then(Value::as_f64) {
        return (n.is_finite() && n >= 0.0 && n.fract() == 0.0).then_some(n as u64);
    }
    if let Some(s) = value.get("stringValue").and_then(Value::as_str) {
        return s.trim().parse().ok();
    }
    None
}
