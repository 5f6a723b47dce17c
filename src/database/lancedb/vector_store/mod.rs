
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, BooleanArray, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};
use tracing::{debug, info};
use uuid::Uuid;

use super::{SearchResult, StoredChunk};
use crate::graph::GraphMetadata;
use crate::loader::{DocumentType, SourceDocument};
use crate::{RagError, Result};

/// Persistent vector store over LanceDB.
///
/// Each collection is a LanceDB table. The vector dimension is pinned by the
/// first batch added to a collection and validated on every later add and
/// search, so mixing embedding providers fails loudly instead of silently
/// corrupting similarity geometry.
pub struct VectorStore {
    connection: Connection,
    collection: String,
    dimension: Option<usize>,
    graph_columns: bool,
}

impl VectorStore {
    /// Open the store for `collection` under `db_dir`, creating the
    /// database directory as needed. The collection's table is created
    /// lazily on first add.
    #[inline]
    pub async fn open<P: AsRef<Path>>(db_dir: P, collection: &str) -> Result<Self> {
        Self::open_inner(db_dir.as_ref(), collection, false).await
    }

    pub(crate) async fn open_inner(
        db_dir: &Path,
        collection: &str,
        graph_columns: bool,
    ) -> Result<Self> {
        if collection.trim().is_empty() {
            return Err(RagError::Config("Collection name cannot be empty".to_string()));
        }

        debug!("Initializing LanceDB at path: {:?}", db_dir);

        std::fs::create_dir_all(db_dir).map_err(|e| {
            RagError::Database(format!("Failed to create vector database directory: {}", e))
        })?;

        let uri = format!("file://{}", db_dir.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        let mut store = Self {
            connection,
            collection: collection.to_string(),
            dimension: None,
            graph_columns,
        };

        if store.table_exists().await? {
            store.dimension = Some(store.detect_dimension().await?);
            debug!(
                "Opened existing collection {:?} with dimension {:?}",
                store.collection, store.dimension
            );
        }

        info!("Vector store ready for collection {:?}", store.collection);
        Ok(store)
    }

    /// Name of the active collection.
    #[inline]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Pinned vector dimension, once the first batch has been added.
    #[inline]
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Add documents with their embeddings.
    ///
    /// The two slices must be the same length and every vector must match
    /// the collection dimension; validation happens before any write, so a
    /// failed add leaves the collection unchanged. Returns the number of
    /// records written.
    #[inline]
    pub async fn add(
        &mut self,
        documents: &[SourceDocument],
        vectors: &[Vec<f32>],
    ) -> Result<usize> {
        self.add_records(documents, vectors, None).await
    }

    pub(crate) async fn add_records(
        &mut self,
        documents: &[SourceDocument],
        vectors: &[Vec<f32>],
        graph_metadata: Option<&[GraphMetadata]>,
    ) -> Result<usize> {
        if documents.len() != vectors.len() {
            return Err(RagError::DimensionMismatch {
                expected: documents.len(),
                actual: vectors.len(),
            });
        }

        if documents.is_empty() {
            debug!("No documents to store");
            return Ok(0);
        }

        let dimension = match self.dimension {
            Some(dim) => dim,
            None => vectors[0].len(),
        };

        for vector in vectors {
            if vector.len() != dimension {
                return Err(RagError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
        }

        if !self.table_exists().await? {
            info!(
                "Creating collection {:?} with dimension {}",
                self.collection, dimension
            );
            let schema = self.create_schema(dimension);
            self.connection
                .create_empty_table(&self.collection, schema)
                .execute()
                .await
                .map_err(|e| RagError::Database(format!("Failed to create table: {}", e)))?;
        }
        self.dimension = Some(dimension);

        let batch = self.create_record_batch(documents, vectors, graph_metadata, dimension)?;

        let table = self.open_table().await?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to insert records: {}", e)))?;

        info!(
            "Stored {} records in collection {:?}",
            documents.len(),
            self.collection
        );
        Ok(documents.len())
    }

    /// Search for the chunks most similar to `query_vector`.
    ///
    /// Returns at most `min(top_k, len)` results ordered by descending
    /// score, where `score = 1 - cosine_distance`. An empty or absent
    /// collection yields an empty result, not an error.
    #[inline]
    pub async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if !self.table_exists().await? {
            return Ok(Vec::new());
        }

        let count = self.len().await?;
        if count == 0 || top_k == 0 {
            return Ok(Vec::new());
        }

        if let Some(dimension) = self.dimension {
            if query_vector.len() != dimension {
                return Err(RagError::DimensionMismatch {
                    expected: dimension,
                    actual: query_vector.len(),
                });
            }
        }

        let table = self.open_table().await?;
        let mut results = table
            .vector_search(query_vector)
            .map_err(|e| RagError::Database(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .distance_type(DistanceType::Cosine)
            .limit(top_k.min(count))
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to execute search: {}", e)))?;

        let mut hits = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| RagError::Database(format!("Failed to read result stream: {}", e)))?
        {
            hits.extend(self.parse_search_batch(&batch)?);
        }

        debug!("Search returned {} results", hits.len());
        Ok(hits)
    }

    /// Number of records in the active collection.
    #[inline]
    pub async fn len(&self) -> Result<usize> {
        if !self.table_exists().await? {
            return Ok(0);
        }

        let table = self.open_table().await?;
        table
            .count_rows(None)
            .await
            .map_err(|e| RagError::Database(format!("Failed to count rows: {}", e)))
    }

    /// Remove every record from the active collection. The collection
    /// remains usable; the next add re-pins its dimension.
    #[inline]
    pub async fn clear(&mut self) -> Result<()> {
        if self.table_exists().await? {
            self.connection
                .drop_table(&self.collection)
                .await
                .map_err(|e| RagError::Database(format!("Failed to drop table: {}", e)))?;
            info!("Cleared collection {:?}", self.collection);
        }
        self.dimension = None;
        Ok(())
    }

    /// Names of all collections in the database.
    #[inline]
    pub async fn collections(&self) -> Result<Vec<String>> {
        self.connection
            .table_names()
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to list tables: {}", e)))
    }

    /// Delete a collection by name. Deleting the active collection leaves
    /// the handle valid: an empty collection is recreated on the next add.
    #[inline]
    pub async fn delete_collection(&mut self, name: &str) -> Result<()> {
        let names = self.collections().await?;
        if names.iter().any(|n| n == name) {
            self.connection
                .drop_table(name)
                .await
                .map_err(|e| RagError::Database(format!("Failed to drop table: {}", e)))?;
            info!("Deleted collection {:?}", name);
        }

        if name == self.collection {
            self.dimension = None;
        }
        Ok(())
    }

    /// Enumerate every stored chunk in storage order.
    pub(crate) async fn scan_all(&self) -> Result<Vec<StoredChunk>> {
        if !self.table_exists().await? {
            return Ok(Vec::new());
        }

        let table = self.open_table().await?;
        let mut results = table
            .query()
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to scan table: {}", e)))?;

        let mut chunks = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| RagError::Database(format!("Failed to read scan stream: {}", e)))?
        {
            for row in 0..batch.num_rows() {
                chunks.push(self.parse_stored_chunk(&batch, row)?);
            }
        }

        Ok(chunks)
    }

    async fn table_exists(&self) -> Result<bool> {
        let names = self.collections().await?;
        Ok(names.iter().any(|n| n == &self.collection))
    }

    async fn open_table(&self) -> Result<lancedb::Table> {
        self.connection
            .open_table(&self.collection)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to open table: {}", e)))
    }

    async fn detect_dimension(&self) -> Result<usize> {
        let table = self.open_table().await?;
        let schema = table
            .schema()
            .await
            .map_err(|e| RagError::Database(format!("Failed to get table schema: {}", e)))?;

        for field in schema.fields() {
            if field.name() == "vector" {
                if let DataType::FixedSizeList(_, size) = field.data_type() {
                    return Ok(*size as usize);
                }
            }
        }

        Err(RagError::Database(
            "Could not find vector column or determine dimension".to_string(),
        ))
    }

    fn create_schema(&self, dimension: usize) -> Arc<Schema> {
        let mut fields = vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    dimension as i32,
                ),
                false,
            ),
            Field::new("content", DataType::Utf8, false),
            Field::new("source", DataType::Utf8, false),
            Field::new("doc_type", DataType::Utf8, false),
            Field::new("chunk_id", DataType::Utf8, false),
            Field::new("created_at", DataType::Utf8, false),
        ];

        if self.graph_columns {
            fields.extend([
                Field::new("entities", DataType::Utf8, false),
                Field::new("entity_types", DataType::Utf8, false),
                Field::new("relations", DataType::Utf8, false),
                Field::new("keywords", DataType::Utf8, false),
                Field::new("has_graph", DataType::Boolean, false),
            ]);
        }

        Arc::new(Schema::new(fields))
    }

    fn create_record_batch(
        &self,
        documents: &[SourceDocument],
        vectors: &[Vec<f32>],
        graph_metadata: Option<&[GraphMetadata]>,
        dimension: usize,
    ) -> Result<RecordBatch> {
        let len = documents.len();

        let ids: Vec<String> = (0..len).map(|_| Uuid::new_v4().to_string()).collect();
        let created_at = Utc::now().to_rfc3339();

        let mut flat_values = Vec::with_capacity(len * dimension);
        for vector in vectors {
            flat_values.extend_from_slice(vector);
        }
        let values_array = Float32Array::from(flat_values);
        let item_field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array = FixedSizeListArray::try_new(
            item_field,
            dimension as i32,
            Arc::new(values_array),
            None,
        )
        .map_err(|e| RagError::Database(format!("Failed to create vector array: {}", e)))?;

        let contents: Vec<&str> = documents.iter().map(|d| d.content.as_str()).collect();
        let sources: Vec<&str> = documents.iter().map(|d| d.source.as_str()).collect();
        let doc_types: Vec<&str> = documents.iter().map(|d| d.doc_type.as_str()).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let created_ats: Vec<&str> = (0..len).map(|_| created_at.as_str()).collect();

        let mut arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(id_refs.clone())),
            Arc::new(vector_array),
            Arc::new(StringArray::from(contents)),
            Arc::new(StringArray::from(sources)),
            Arc::new(StringArray::from(doc_types)),
            // The record id doubles as the chunk id in metadata
            Arc::new(StringArray::from(id_refs)),
            Arc::new(StringArray::from(created_ats)),
        ];

        if self.graph_columns {
            let mut entities = Vec::with_capacity(len);
            let mut entity_types = Vec::with_capacity(len);
            let mut relations = Vec::with_capacity(len);
            let mut keywords = Vec::with_capacity(len);
            let mut has_graph = Vec::with_capacity(len);

            for i in 0..len {
                let metadata = graph_metadata.and_then(|m| m.get(i));
                match metadata {
                    Some(m) => {
                        entities.push(encode_json(&m.entities)?);
                        entity_types.push(encode_json(&m.entity_types)?);
                        relations.push(encode_json(&m.relations)?);
                        keywords.push(encode_json(&m.keywords)?);
                        has_graph.push(m.has_graph_data);
                    }
                    None => {
                        entities.push("[]".to_string());
                        entity_types.push("[]".to_string());
                        relations.push("[]".to_string());
                        keywords.push("[]".to_string());
                        has_graph.push(false);
                    }
                }
            }

            arrays.extend([
                Arc::new(StringArray::from(entities)) as Arc<dyn Array>,
                Arc::new(StringArray::from(entity_types)),
                Arc::new(StringArray::from(relations)),
                Arc::new(StringArray::from(keywords)),
                Arc::new(BooleanArray::from(has_graph)),
            ]);
        }

        let schema = self.create_schema(dimension);
        RecordBatch::try_new(schema, arrays)
            .map_err(|e| RagError::Database(format!("Failed to create record batch: {}", e)))
    }

    fn parse_search_batch(&self, batch: &RecordBatch) -> Result<Vec<SearchResult>> {
        let distances = batch
            .column_by_name("_distance")
            .map(|col| col.as_any().downcast_ref::<Float32Array>());

        let mut results = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let chunk = self.parse_stored_chunk(batch, row)?;

            let distance = distances
                .flatten()
                .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

            results.push(SearchResult {
                content: chunk.content,
                source: chunk.source,
                doc_type: chunk.doc_type,
                chunk_id: chunk.chunk_id,
                score: 1.0 - distance,
                graph: chunk.graph,
            });
        }

        Ok(results)
    }

    fn parse_stored_chunk(&self, batch: &RecordBatch, row: usize) -> Result<StoredChunk> {
        let contents = string_column(batch, "content")?;
        let sources = string_column(batch, "source")?;
        let doc_types = string_column(batch, "doc_type")?;
        let chunk_ids = string_column(batch, "chunk_id")?;

        let graph = if self.graph_columns {
            self.parse_graph_metadata(batch, row, chunk_ids.value(row))?
        } else {
            None
        };

        Ok(StoredChunk {
            content: contents.value(row).to_string(),
            source: sources.value(row).to_string(),
            doc_type: DocumentType::from_str_lossy(doc_types.value(row)),
            chunk_id: chunk_ids.value(row).to_string(),
            graph,
        })
    }

    fn parse_graph_metadata(
        &self,
        batch: &RecordBatch,
        row: usize,
        chunk_id: &str,
    ) -> Result<Option<GraphMetadata>> {
        let has_graph = batch
            .column_by_name("has_graph")
            .and_then(|col| col.as_any().downcast_ref::<BooleanArray>());

        let Some(has_graph) = has_graph else {
            return Ok(None);
        };

        if has_graph.is_null(row) || !has_graph.value(row) {
            return Ok(None);
        }

        let entities = string_column(batch, "entities")?;
        let entity_types = string_column(batch, "entity_types")?;
        let relations = string_column(batch, "relations")?;
        let keywords = string_column(batch, "keywords")?;

        Ok(Some(GraphMetadata {
            chunk_id: chunk_id.to_string(),
            entities: decode_json(entities.value(row)),
            entity_types: decode_json(entity_types.value(row)),
            relations: decode_json(relations.value(row)),
            keywords: decode_json(keywords.value(row)),
            has_graph_data: true,
        }))
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| RagError::Database(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| RagError::Database(format!("Invalid {} column type", name)))
}

fn encode_json(values: &[String]) -> Result<String> {
    serde_json::to_string(values)
        .map_err(|e| RagError::Database(format!("Failed to encode metadata: {}", e)))
}

fn decode_json(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}
