
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::models::{CollectionRecord, DocumentRecord, NewDocument};

pub struct CollectionQueries;

impl CollectionQueries {
    #[inline]
    pub async fn create(
        pool: &SqlitePool,
        name: &str,
        embedding_model: &str,
        dimension: i64,
    ) -> Result<CollectionRecord> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO collections (name, embedding_model, dimension, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(embedding_model)
        .bind(dimension)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create collection record")?;

        Self::get(pool, name)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created collection"))
    }

    #[inline]
    pub async fn get(pool: &SqlitePool, name: &str) -> Result<Option<CollectionRecord>> {
        sqlx::query_as::<_, CollectionRecord>(
            "SELECT name, embedding_model, dimension, created_at FROM collections WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to get collection record")
    }

    #[inline]
    pub async fn list(pool: &SqlitePool) -> Result<Vec<CollectionRecord>> {
        sqlx::query_as::<_, CollectionRecord>(
            "SELECT name, embedding_model, dimension, created_at FROM collections ORDER BY name",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list collection records")
    }

    #[inline]
    pub async fn delete(pool: &SqlitePool, name: &str) -> Result<()> {
        sqlx::query("DELETE FROM collections WHERE name = ?")
            .bind(name)
            .execute(pool)
            .await
            .context("Failed to delete collection record")?;
        Ok(())
    }
}

pub struct DocumentQueries;

impl DocumentQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, new_document: NewDocument) -> Result<DocumentRecord> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO documents (id, collection, source, doc_type, chunk_count, ingested_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&new_document.collection)
        .bind(&new_document.source)
        .bind(&new_document.doc_type)
        .bind(new_document.chunk_count)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create document record")?;

        Self::get_by_id(pool, &id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created document"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<DocumentRecord>> {
        sqlx::query_as::<_, DocumentRecord>(
            "SELECT id, collection, source, doc_type, chunk_count, ingested_at \
             FROM documents WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get document record")
    }

    #[inline]
    pub async fn list_by_collection(
        pool: &SqlitePool,
        collection: &str,
    ) -> Result<Vec<DocumentRecord>> {
        sqlx::query_as::<_, DocumentRecord>(
            "SELECT id, collection, source, doc_type, chunk_count, ingested_at \
             FROM documents WHERE collection = ? ORDER BY ingested_at",
        )
        .bind(collection)
        .fetch_all(pool)
        .await
        .context("Failed to list document records")
    }

    #[inline]
    pub async fn count_by_collection(pool: &SqlitePool, collection: &str) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM documents WHERE collection = ?")
                .bind(collection)
                .fetch_one(pool)
                .await
                .context("Failed to count document records")?;
        Ok(count.0)
    }

    #[inline]
    pub async fn delete_by_collection(pool: &SqlitePool, collection: &str) -> Result<()> {
        sqlx::query("DELETE FROM documents WHERE collection = ?")
            .bind(collection)
            .execute(pool)
            .await
            .context("Failed to delete document records")?;
        Ok(())
    }
}
