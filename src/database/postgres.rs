//! PostgreSQL document backend.
//! One table per collection; the document body lives in a JSONB column.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::database::manager::{is_valid_collection_name, DatabaseError, DocumentBackend};
use crate::database::record::Record;

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    doc: Json<Map<String, Value>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for Record {
    fn from(row: DocumentRow) -> Self {
        Record {
            id: row.id,
            fields: row.doc.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    pub async fn connect(
        connection_string: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(connection_string)
            .await?;
        Ok(Self { pool })
    }
}

/// Quote SQL identifier after validating it
fn table(collection: &str) -> Result<String, DatabaseError> {
    if !is_valid_collection_name(collection) {
        return Err(DatabaseError::InvalidCollectionName(collection.to_string()));
    }
    Ok(format!("\"{}\"", collection))
}

#[async_trait]
impl DocumentBackend for PostgresBackend {
    fn kind(&self) -> &'static str {
        "postgres"
    }

    async fn ensure_collection(&self, collection: &str) -> Result<(), DatabaseError> {
        let table = table(collection)?;
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                doc JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
            table
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        info!("Ensured collection table {}", table);
        Ok(())
    }

    async fn insert(&self, collection: &str, record: &Record) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO {} (id, doc, created_at, updated_at) VALUES ($1, $2, $3, $4)",
            table(collection)?
        );
        sqlx::query(&sql)
            .bind(record.id)
            .bind(Json(&record.fields))
            .bind(record.created_at)
            .bind(record.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Record>, DatabaseError> {
        let sql = format!(
            "SELECT id, doc, created_at, updated_at FROM {} ORDER BY created_at",
            table(collection)?
        );
        let rows = sqlx::query_as::<_, DocumentRow>(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Record::from).collect())
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<Record>, DatabaseError> {
        let sql = format!(
            "SELECT id, doc, created_at, updated_at FROM {} WHERE id = $1",
            table(collection)?
        );
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Record::from))
    }

    async fn find_by_ids(
        &self,
        collection: &str,
        ids: &[Uuid],
    ) -> Result<Vec<Record>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!(
            "SELECT id, doc, created_at, updated_at FROM {} WHERE id = ANY($1)",
            table(collection)?
        );
        let rows = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Record::from).collect())
    }

    async fn replace(
        &self,
        collection: &str,
        record: &Record,
    ) -> Result<Option<Record>, DatabaseError> {
        let sql = format!(
            "UPDATE {} SET doc = $2, updated_at = $3 WHERE id = $1
             RETURNING id, doc, created_at, updated_at",
            table(collection)?
        );
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(record.id)
            .bind(Json(&record.fields))
            .bind(record.updated_at)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Record::from))
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<Option<Record>, DatabaseError> {
        let sql = format!(
            "DELETE FROM {} WHERE id = $1 RETURNING id, doc, created_at, updated_at",
            table(collection)?
        );
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Record::from))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
