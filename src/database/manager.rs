use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::database::memory::MemoryBackend;
use crate::database::postgres::PostgresBackend;
use crate::database::record::Record;

/// Errors from the document store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("Unsupported database scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid collection name: {0}")]
    InvalidCollectionName(String),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Storage operations over named document collections.
///
/// Single-document operations are atomic as far as the backend makes them;
/// nothing here coordinates across documents or collections.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Short name used in logs and `/health`
    fn kind(&self) -> &'static str;

    /// Create the collection if it does not exist yet
    async fn ensure_collection(&self, collection: &str) -> Result<(), DatabaseError>;

    async fn insert(&self, collection: &str, record: &Record) -> Result<(), DatabaseError>;

    async fn find_all(&self, collection: &str) -> Result<Vec<Record>, DatabaseError>;

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Record>, DatabaseError>;

    /// Batched lookup; missing ids are simply absent from the result
    async fn find_by_ids(
        &self,
        collection: &str,
        ids: &[Uuid],
    ) -> Result<Vec<Record>, DatabaseError>;

    /// Overwrite the stored document with the same id. `None` if it is gone.
    async fn replace(
        &self,
        collection: &str,
        record: &Record,
    ) -> Result<Option<Record>, DatabaseError>;

    /// Remove and return the document. `None` if it did not exist.
    async fn delete(&self, collection: &str, id: Uuid) -> Result<Option<Record>, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;

    async fn close(&self);
}

/// Explicitly constructed storage client shared by every resource store
#[derive(Clone)]
pub struct DocumentStore {
    backend: Arc<dyn DocumentBackend>,
}

impl DocumentStore {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self { backend }
    }

    /// Fresh in-process store (used by `memory://` and tests)
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Connect according to `DATABASE_URL`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let raw = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        if raw.starts_with("memory:") {
            info!("Using in-memory document store");
            return Ok(Self::memory());
        }

        let url = url::Url::parse(raw)
            .map_err(|e| DatabaseError::InvalidDatabaseUrl(e.to_string()))?;
        match url.scheme() {
            "postgres" | "postgresql" => {
                let backend = PostgresBackend::connect(
                    raw,
                    config.max_connections,
                    Duration::from_secs(config.connection_timeout),
                )
                .await?;
                info!("Connected to PostgreSQL at {}", redact(&url));
                Ok(Self::new(Arc::new(backend)))
            }
            other => Err(DatabaseError::UnsupportedScheme(other.to_string())),
        }
    }

    pub fn backend(&self) -> &dyn DocumentBackend {
        self.backend.as_ref()
    }

    pub fn kind(&self) -> &'static str {
        self.backend.kind()
    }

    /// Pings the backend to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        self.backend.ping().await
    }

    /// Release connections; call once on shutdown
    pub async fn close(&self) {
        self.backend.close().await;
        info!("Closed {} document store", self.kind());
    }
}

/// Validate collection names before they are spliced into SQL identifiers.
/// Accepts lower-case ASCII letters, digits and `_`, starting with a letter.
pub fn is_valid_collection_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Connection URL with the password masked, for logs
fn redact(url: &url::Url) -> String {
    let mut masked = url.clone();
    if masked.password().is_some() {
        let _ = masked.set_password(Some("***"));
    }
    masked.to_string()
}
