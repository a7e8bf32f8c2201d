//! Generic CRUD store, one instance per resource schema.

pub mod populate;

use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::database::record::parse_id;
use crate::database::{DatabaseError, DocumentStore, Record};
use crate::schema::{cast_create, cast_update, RecordError, ResourceSchema};
use crate::types::Operation;

pub use populate::ReferencePopulator;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("{message}: {source}")]
    Validation {
        message: String,
        #[source]
        source: RecordError,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Persistence {
        message: String,
        #[source]
        source: DatabaseError,
    },
}

#[derive(Clone)]
pub struct ResourceStore {
    schema: Arc<ResourceSchema>,
    store: DocumentStore,
}

impl ResourceStore {
    pub fn new(schema: ResourceSchema, store: DocumentStore) -> Self {
        Self { schema: Arc::new(schema), store }
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    /// Create the backing collection if needed
    pub async fn ensure(&self) -> Result<(), DatabaseError> {
        self.store.backend().ensure_collection(self.schema.collection).await
    }

    pub async fn create(&self, input: Map<String, Value>) -> Result<Record, ResourceError> {
        let fields = cast_create(&self.schema, input)
            .map_err(|e| self.invalid(Operation::Create, e))?;
        let record = Record::new(fields);
        self.store
            .backend()
            .insert(self.schema.collection, &record)
            .await
            .map_err(|e| self.persistence(Operation::Create, e))?;
        debug!("Created {} {}", self.schema.collection, record.id);
        Ok(record)
    }

    /// Every record, rendered and populated
    pub async fn list(&self) -> Result<Vec<Value>, ResourceError> {
        let records = self
            .store
            .backend()
            .find_all(self.schema.collection)
            .await
            .map_err(|e| self.persistence(Operation::List, e))?;
        debug!("Listed {} {}", records.len(), self.schema.collection);

        let mut docs: Vec<Value> = records.iter().map(|r| self.render(r)).collect();
        self.populate(&mut docs, Operation::List).await?;
        Ok(docs)
    }

    pub async fn get(&self, id: &str) -> Result<Value, ResourceError> {
        let id = self.parse(id)?;
        let record = self
            .store
            .backend()
            .find_by_id(self.schema.collection, id)
            .await
            .map_err(|e| self.persistence(Operation::Get, e))?
            .ok_or_else(|| self.not_found())?;

        let mut docs = vec![self.render(&record)];
        self.populate(&mut docs, Operation::Get).await?;
        Ok(docs.pop().unwrap_or(Value::Null))
    }

    /// Shallow-merge the sent fields into the stored record. Concurrent
    /// updates are last-write-wins.
    pub async fn update(
        &self,
        id: &str,
        input: Map<String, Value>,
    ) -> Result<Record, ResourceError> {
        let id = self.parse(id)?;
        let changes = cast_update(&self.schema, input)
            .map_err(|e| self.invalid(Operation::Update, e))?;

        let backend = self.store.backend();
        let mut record = backend
            .find_by_id(self.schema.collection, id)
            .await
            .map_err(|e| self.persistence(Operation::Update, e))?
            .ok_or_else(|| self.not_found())?;

        record.merge(changes);
        let updated = backend
            .replace(self.schema.collection, &record)
            .await
            .map_err(|e| self.persistence(Operation::Update, e))?
            .ok_or_else(|| self.not_found())?;
        debug!("Updated {} {}", self.schema.collection, updated.id);
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<Record, ResourceError> {
        let id = self.parse(id)?;
        let deleted = self
            .store
            .backend()
            .delete(self.schema.collection, id)
            .await
            .map_err(|e| self.persistence(Operation::Delete, e))?
            .ok_or_else(|| self.not_found())?;
        debug!("Deleted {} {}", self.schema.collection, deleted.id);
        Ok(deleted)
    }

    /// Public JSON shape of a stored record
    pub fn render(&self, record: &Record) -> Value {
        record.to_api_output(self.schema.timestamps)
    }

    async fn populate(&self, docs: &mut [Value], op: Operation) -> Result<(), ResourceError> {
        let Some(spec) = &self.schema.reference else {
            return Ok(());
        };
        ReferencePopulator::new(spec, &self.store)
            .populate(docs)
            .await
            .map_err(|e| self.persistence(op, e))
    }

    fn parse(&self, id: &str) -> Result<Uuid, ResourceError> {
        parse_id(id).ok_or_else(|| self.not_found())
    }

    fn not_found(&self) -> ResourceError {
        ResourceError::NotFound(self.schema.not_found_message())
    }

    /// Client-facing message for a failed operation ("Error adding employee")
    pub fn error_message(&self, op: Operation) -> String {
        format!("Error {} {}", op.verb(), self.schema.label.to_lowercase())
    }

    fn invalid(&self, op: Operation, source: RecordError) -> ResourceError {
        warn!("Rejected {} input: {}", self.schema.collection, source);
        ResourceError::Validation { message: self.error_message(op), source }
    }

    fn persistence(&self, op: Operation, source: DatabaseError) -> ResourceError {
        let message = self.error_message(op);
        error!("{} in {}: {}", message, self.schema.collection, source);
        ResourceError::Persistence { message, source }
    }
}
