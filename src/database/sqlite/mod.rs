#[cfg(test)]
mod tests;

pub mod models;
pub mod queries;

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::{debug, info};

use models::{CollectionRecord, DocumentRecord, NewDocument};
use queries::{CollectionQueries, DocumentQueries};

pub type DbPool = Pool<Sqlite>;

/// Ingestion catalog: collection-level embedding metadata plus one row per
/// ingested source document.
///
/// The collection rows pin the embedding model and dimension a collection
/// was created with, so a provider switch is caught before it corrupts the
/// vector data.
#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.create_schema().await?;

        Ok(database)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn create_schema(&self) -> Result<()> {
        info!("Ensuring catalog schema");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                embedding_model TEXT NOT NULL,
                dimension INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create collections table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                source TEXT NOT NULL,
                doc_type TEXT NOT NULL,
                chunk_count INTEGER NOT NULL,
                ingested_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create documents table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)")
            .execute(&self.pool)
            .await
            .context("Failed to create documents index")?;

        debug!("Catalog schema ready");
        Ok(())
    }

    // Collection operations

    pub async fn get_collection(&self, name: &str) -> Result<Option<CollectionRecord>> {
        CollectionQueries::get(&self.pool, name).await
    }

    pub async fn register_collection(
        &self,
        name: &str,
        embedding_model: &str,
        dimension: usize,
    ) -> Result<CollectionRecord> {
        CollectionQueries::create(&self.pool, name, embedding_model, dimension as i64).await
    }

    pub async fn list_collections(&self) -> Result<Vec<CollectionRecord>> {
        CollectionQueries::list(&self.pool).await
    }

    /// Remove a collection's catalog row and all of its document records.
    pub async fn forget_collection(&self, name: &str) -> Result<()> {
        CollectionQueries::delete(&self.pool, name).await?;
        DocumentQueries::delete_by_collection(&self.pool, name).await?;
        Ok(())
    }

    // Document operations

    pub async fn record_document(&self, document: NewDocument) -> Result<DocumentRecord> {
        DocumentQueries::create(&self.pool, document).await
    }

    pub async fn documents_for_collection(&self, collection: &str) -> Result<Vec<DocumentRecord>> {
        DocumentQueries::list_by_collection(&self.pool, collection).await
    }

    pub async fn document_count(&self, collection: &str) -> Result<i64> {
        DocumentQueries::count_by_collection(&self.pool, collection).await
    }
}
