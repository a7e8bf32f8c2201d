//! In-process document backend.
//! Selected with `DATABASE_URL=memory://`; contents vanish with the process.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::{is_valid_collection_name, DatabaseError, DocumentBackend};
use crate::database::record::Record;

/// Collections keyed by name; each keeps insertion order
#[derive(Default)]
pub struct MemoryBackend {
    collections: RwLock<HashMap<String, Vec<Record>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unknown(collection: &str) -> DatabaseError {
    DatabaseError::UnknownCollection(collection.to_string())
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn ensure_collection(&self, collection: &str) -> Result<(), DatabaseError> {
        if !is_valid_collection_name(collection) {
            return Err(DatabaseError::InvalidCollectionName(collection.to_string()));
        }
        let mut collections = self.collections.write().await;
        collections.entry(collection.to_string()).or_default();
        Ok(())
    }

    async fn insert(&self, collection: &str, record: &Record) -> Result<(), DatabaseError> {
        let mut collections = self.collections.write().await;
        let docs = collections.get_mut(collection).ok_or_else(|| unknown(collection))?;
        if docs.iter().any(|d| d.id == record.id) {
            return Err(DatabaseError::QueryError(format!(
                "duplicate id {} in {}",
                record.id, collection
            )));
        }
        docs.push(record.clone());
        Ok(())
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Record>, DatabaseError> {
        let collections = self.collections.read().await;
        collections.get(collection).cloned().ok_or_else(|| unknown(collection))
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<Record>, DatabaseError> {
        let collections = self.collections.read().await;
        let docs = collections.get(collection).ok_or_else(|| unknown(collection))?;
        Ok(docs.iter().find(|d| d.id == id).cloned())
    }

    async fn find_by_ids(
        &self,
        collection: &str,
        ids: &[Uuid],
    ) -> Result<Vec<Record>, DatabaseError> {
        let collections = self.collections.read().await;
        let docs = collections.get(collection).ok_or_else(|| unknown(collection))?;
        Ok(docs.iter().filter(|d| ids.contains(&d.id)).cloned().collect())
    }

    async fn replace(
        &self,
        collection: &str,
        record: &Record,
    ) -> Result<Option<Record>, DatabaseError> {
        let mut collections = self.collections.write().await;
        let docs = collections.get_mut(collection).ok_or_else(|| unknown(collection))?;
        match docs.iter_mut().find(|d| d.id == record.id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<Option<Record>, DatabaseError> {
        let mut collections = self.collections.write().await;
        let docs = collections.get_mut(collection).ok_or_else(|| unknown(collection))?;
        Ok(docs.iter().position(|d| d.id == id).map(|idx| docs.remove(idx)))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn close(&self) {
        self.collections.write().await.clear();
    }
}
