//! In-memory record store
//!
//! Keeps documents in insertion order behind an async `RwLock` and hands out
//! UUID ids, mirroring how a document database assigns them.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RecordStore, StoreError, StoreResult};
use crate::records::{Record, RecordFields, RecordId};

/// Record store held entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records (ids are kept as given)
    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Fetch one record by id
    pub async fn get(&self, id: &RecordId) -> Option<Record> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| &r.id == id)
            .cloned()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_all(&self) -> StoreResult<Vec<Record>> {
        Ok(self.records.read().await.clone())
    }

    async fn create(&self, fields: &RecordFields) -> StoreResult<RecordId> {
        let id = RecordId::new(Uuid::new_v4().simple().to_string());
        self.records
            .write()
            .await
            .push(Record::new(id.clone(), fields.clone()));
        Ok(id)
    }

    async fn update(&self, id: &RecordId, fields: &RecordFields) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        record.fields = fields.clone();
        Ok(())
    }

    async fn delete(&self, id: &RecordId) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| &r.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cebu() -> RecordFields {
        RecordFields::new("Cebu", 40, 0, "2023-02-01", "Region VII")
    }

    #[tokio::test]
    async fn test_create_assigns_distinct_ids() {
        let store = MemoryStore::new();
        let a = store.create(&cebu()).await.unwrap();
        let b = store.create(&cebu()).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryStore::new();
        let id = store.create(&cebu()).await.unwrap();

        let mut fields = cebu();
        fields.cases = Some(120);
        store.update(&id, &fields).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap().fields.cases, Some(120));

        store.delete(&id).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_ids_fail() {
        let store = MemoryStore::new();
        let ghost = RecordId::from("ghost");
        assert!(matches!(
            store.update(&ghost, &cebu()).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(&ghost).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_preserves_order() {
        let store = MemoryStore::with_records(vec![
            Record::new("b", cebu()),
            Record::new("a", cebu()),
        ]);
        let ids: Vec<_> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![RecordId::from("b"), RecordId::from("a")]);
    }
}
