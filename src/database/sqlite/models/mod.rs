
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Catalog row pinning the embedding setup a collection was created with
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub name: String,
    pub embedding_model: String,
    pub dimension: i64,
    pub created_at: DateTime<Utc>,
}

/// Catalog row for one ingested source document
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub collection: String,
    pub source: String,
    pub doc_type: String,
    pub chunk_count: i64,
    pub ingested_at: DateTime<Utc>,
}

/// Insert shape for a document record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub collection: String,
    pub source: String,
    pub doc_type: String,
    pub chunk_count: i64,
}
