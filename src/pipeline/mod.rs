// Pipeline module
// Orchestrates chunking, embedding, storage, retrieval, and generation


use std::sync::Arc;

use itertools::Itertools;
use tracing::{debug, info};

use crate::chunker::TextChunker;
use crate::config::Config;
use crate::database::lancedb::{GraphVectorStore, SearchResult, VectorStore};
use crate::database::sqlite::Database;
use crate::database::sqlite::models::NewDocument;
use crate::embeddings::{EmbeddingProvider, provider_from_config};
use crate::generation::{GenerationProvider, OpenAiGeneration};
use crate::graph::{GraphExtractor, GraphMetadata, GraphTraversal, Relation};
use crate::loader::SourceDocument;
use crate::{RagError, Result};

const NO_CONTEXT_ANSWER: &str =
    "I don't have any relevant information to answer this question.";

const ANSWER_SYSTEM_PROMPT: &str = "You are a helpful assistant. Answer questions based on the \
     provided context. Cite sources when possible. If the context does not contain the relevant \
     information, say so.";

const GRAPH_ANSWER_SYSTEM_PROMPT: &str = "You are a helpful assistant with access to a knowledge \
     graph. Answer questions based on the provided context and relationships. Cite sources when \
     possible. If the context does not contain the relevant information, say so.";

const ANSWER_TEMPERATURE: f32 = 0.7;

/// Relations appended to a graph-augmented context are capped to keep the
/// prompt within budget
const MAX_CONTEXT_RELATIONS: usize = 10;

/// Summary statistics for a collection
#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub collection: String,
    pub total_chunks: usize,
    pub total_documents: i64,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub generation_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

/// Summary statistics for a graph-enhanced collection
#[derive(Debug, Clone)]
pub struct GraphPipelineStats {
    pub base: PipelineStats,
    pub total_entities: usize,
    pub total_relations: usize,
    pub top_entities: Vec<(String, usize)>,
}

/// Retrieval-augmented generation pipeline: chunk, embed, store, retrieve,
/// generate.
pub struct RagPipeline {
    chunker: TextChunker,
    embeddings: Box<dyn EmbeddingProvider>,
    generation: Arc<dyn GenerationProvider>,
    store: VectorStore,
    catalog: Database,
}

impl RagPipeline {
    /// Build the pipeline from configuration. Provider credentials resolve
    /// lazily at first use.
    #[inline]
    pub async fn new(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.base_dir)?;

        let chunker = TextChunker::from_config(&config.chunking)?;
        let embeddings = provider_from_config(&config.embedding)?;
        let generation: Arc<dyn GenerationProvider> =
            Arc::new(OpenAiGeneration::new(config.generation.clone(), None)?);
        let store = VectorStore::open(config.vector_database_path(), &config.collection).await?;
        let catalog = Database::new(config.catalog_path()).await?;

        Ok(Self {
            chunker,
            embeddings,
            generation,
            store,
            catalog,
        })
    }

    /// Assemble a pipeline from explicit components.
    #[inline]
    pub fn from_parts(
        chunker: TextChunker,
        embeddings: Box<dyn EmbeddingProvider>,
        generation: Arc<dyn GenerationProvider>,
        store: VectorStore,
        catalog: Database,
    ) -> Self {
        Self {
            chunker,
            embeddings,
            generation,
            store,
            catalog,
        }
    }

    #[inline]
    pub fn collection(&self) -> &str {
        self.store.collection()
    }

    /// Chunk, embed, and store documents. Returns the number of chunks
    /// added; a document set that yields no chunks returns 0.
    #[inline]
    pub async fn ingest(&mut self, documents: &[SourceDocument]) -> Result<usize> {
        let (chunks, per_document) = chunk_documents(&self.chunker, documents);

        if chunks.is_empty() {
            info!("No chunks created from {} documents", documents.len());
            return Ok(0);
        }

        verify_provider(&self.catalog, self.store.collection(), self.embeddings.as_ref()).await?;

        info!("Created {} chunks, generating embeddings", chunks.len());
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embeddings.embed_batch(&texts)?;

        let added = self.store.add(&chunks, &vectors).await?;

        record_ingestion(
            &self.catalog,
            self.store.collection(),
            self.embeddings.as_ref(),
            documents,
            &per_document,
        )
        .await?;

        info!(
            "Added {} chunks to collection {:?}",
            added,
            self.store.collection()
        );
        Ok(added)
    }

    /// Embed the query and return the top matching chunks.
    #[inline]
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        verify_provider(&self.catalog, self.store.collection(), self.embeddings.as_ref()).await?;

        let query_vector = self.embeddings.embed(query)?;
        self.store.search(&query_vector, top_k).await
    }

    /// Answer a question from retrieved context. With no matching chunks the
    /// canned no-information response is returned without a generation call.
    #[inline]
    pub async fn answer(&self, question: &str, top_k: usize, max_tokens: u32) -> Result<String> {
        let results = self.search(question, top_k).await?;

        if results.is_empty() {
            return Ok(NO_CONTEXT_ANSWER.to_string());
        }

        let context = build_context(&results);
        let prompt = render_answer_prompt(&context, question);

        self.generation
            .complete(ANSWER_SYSTEM_PROMPT, &prompt, max_tokens, ANSWER_TEMPERATURE)
    }

    #[inline]
    pub async fn len(&self) -> Result<usize> {
        self.store.len().await
    }

    #[inline]
    pub async fn clear(&mut self) -> Result<()> {
        self.store.clear().await?;
        self.catalog
            .forget_collection(&self.store.collection().to_string())
            .await?;
        Ok(())
    }

    #[inline]
    pub async fn collections(&self) -> Result<Vec<String>> {
        self.store.collections().await
    }

    #[inline]
    pub async fn delete_collection(&mut self, name: &str) -> Result<()> {
        self.store.delete_collection(name).await?;
        self.catalog.forget_collection(name).await?;
        Ok(())
    }

    #[inline]
    pub async fn stats(&self) -> Result<PipelineStats> {
        Ok(PipelineStats {
            collection: self.store.collection().to_string(),
            total_chunks: self.store.len().await?,
            total_documents: self.catalog.document_count(self.store.collection()).await?,
            embedding_model: self.embeddings.model_name().to_string(),
            embedding_dimension: self.embeddings.dimension(),
            generation_model: self.generation.model_name().to_string(),
            chunk_size: self.chunker.chunk_size(),
            chunk_overlap: self.chunker.chunk_overlap(),
        })
    }
}

/// RAG pipeline with a knowledge graph overlay: graph metadata is extracted
/// per chunk during ingestion and can augment answer context.
pub struct GraphRagPipeline {
    chunker: TextChunker,
    embeddings: Box<dyn EmbeddingProvider>,
    generation: Arc<dyn GenerationProvider>,
    extractor: GraphExtractor,
    store: GraphVectorStore,
    catalog: Database,
}

impl GraphRagPipeline {
    /// Build the graph pipeline from configuration. LLM-based extraction is
    /// attached when enabled; the pattern fallback always remains available.
    #[inline]
    pub async fn new(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.base_dir)?;

        let chunker = TextChunker::from_config(&config.chunking)?;
        let embeddings = provider_from_config(&config.embedding)?;
        let generation: Arc<dyn GenerationProvider> =
            Arc::new(OpenAiGeneration::new(config.generation.clone(), None)?);

        let mut extractor = GraphExtractor::new(config.graph.max_keywords)?;
        if config.graph.llm_extraction {
            extractor = extractor.with_llm(Arc::clone(&generation));
        }

        let store =
            GraphVectorStore::open(config.vector_database_path(), &config.collection).await?;
        let catalog = Database::new(config.catalog_path()).await?;

        Ok(Self {
            chunker,
            embeddings,
            generation,
            extractor,
            store,
            catalog,
        })
    }

    /// Assemble a pipeline from explicit components.
    #[inline]
    pub fn from_parts(
        chunker: TextChunker,
        embeddings: Box<dyn EmbeddingProvider>,
        generation: Arc<dyn GenerationProvider>,
        extractor: GraphExtractor,
        store: GraphVectorStore,
        catalog: Database,
    ) -> Self {
        Self {
            chunker,
            embeddings,
            generation,
            extractor,
            store,
            catalog,
        }
    }

    #[inline]
    pub fn collection(&self) -> &str {
        self.store.collection()
    }

    /// Chunk, embed, extract graph metadata, and store documents.
    #[inline]
    pub async fn ingest(&mut self, documents: &[SourceDocument]) -> Result<usize> {
        let (chunks, per_document) = chunk_documents(&self.chunker, documents);

        if chunks.is_empty() {
            info!("No chunks created from {} documents", documents.len());
            return Ok(0);
        }

        verify_provider(&self.catalog, self.store.collection(), self.embeddings.as_ref()).await?;

        info!("Created {} chunks, generating embeddings", chunks.len());
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embeddings.embed_batch(&texts)?;

        info!("Extracting knowledge graph relationships");
        let graph_metadata: Vec<GraphMetadata> = chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                self.extractor
                    .build_graph_metadata(&chunk.content, &format!("chunk_{}", i))
            })
            .collect();

        let with_graph = graph_metadata.iter().filter(|m| m.has_graph_data).count();
        debug!(
            "Extracted graph data from {} of {} chunks",
            with_graph,
            graph_metadata.len()
        );

        let added = self
            .store
            .add_with_graph(&chunks, &vectors, Some(&graph_metadata))
            .await?;

        record_ingestion(
            &self.catalog,
            self.store.collection(),
            self.embeddings.as_ref(),
            documents,
            &per_document,
        )
        .await?;

        info!(
            "Added {} chunks to graph collection {:?}",
            added,
            self.store.collection()
        );
        Ok(added)
    }

    /// Embed the query and return the top matching chunks, each carrying its
    /// graph metadata when present.
    #[inline]
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        verify_provider(&self.catalog, self.store.collection(), self.embeddings.as_ref()).await?;

        let query_vector = self.embeddings.embed(query)?;
        self.store.search(&query_vector, top_k).await
    }

    /// Find stored chunks mentioning an entity.
    #[inline]
    pub async fn search_by_entity(
        &self,
        entity: &str,
        top_k: usize,
    ) -> Result<Vec<crate::database::lancedb::StoredChunk>> {
        self.store.find_by_entity(entity, top_k).await
    }

    /// All entities in the collection with their chunk-membership counts.
    #[inline]
    pub async fn entities(&self) -> Result<std::collections::HashMap<String, usize>> {
        self.store.get_all_entities().await
    }

    /// The deduplicated relation set of the collection.
    #[inline]
    pub async fn relations(&self) -> Result<Vec<Relation>> {
        self.store.get_all_relations().await
    }

    /// Bounded breadth-first traversal from an entity.
    #[inline]
    pub async fn traverse(&self, entity: &str, max_hops: usize) -> Result<GraphTraversal> {
        self.store.traverse(entity, max_hops).await
    }

    /// Answer a question from retrieved context, optionally augmented with
    /// relations touching the entities the retrieved chunks mention.
    #[inline]
    pub async fn answer(
        &self,
        question: &str,
        top_k: usize,
        max_tokens: u32,
        use_graph_context: bool,
    ) -> Result<String> {
        let results = self.search(question, top_k).await?;

        if results.is_empty() {
            return Ok(NO_CONTEXT_ANSWER.to_string());
        }

        let mut context = build_context(&results);

        if use_graph_context {
            let mentioned: std::collections::HashSet<&str> = results
                .iter()
                .filter_map(|r| r.graph.as_ref())
                .flat_map(|g| g.entities.iter().map(String::as_str))
                .collect();

            if !mentioned.is_empty() {
                let relevant: Vec<Relation> = self
                    .store
                    .get_all_relations()
                    .await?
                    .into_iter()
                    .filter(|r| mentioned.contains(r.source.as_str()) || mentioned.contains(r.target.as_str()))
                    .take(MAX_CONTEXT_RELATIONS)
                    .collect();

                if !relevant.is_empty() {
                    context.push_str("\n\nKnowledge Graph Relationships:\n");
                    for relation in &relevant {
                        context.push_str(&format!(
                            "- {} {} {}\n",
                            relation.source, relation.label, relation.target
                        ));
                    }
                }
            }
        }

        let prompt = render_answer_prompt(&context, question);

        self.generation.complete(
            GRAPH_ANSWER_SYSTEM_PROMPT,
            &prompt,
            max_tokens,
            ANSWER_TEMPERATURE,
        )
    }

    #[inline]
    pub async fn len(&self) -> Result<usize> {
        self.store.len().await
    }

    #[inline]
    pub async fn clear(&mut self) -> Result<()> {
        self.store.clear().await?;
        self.catalog
            .forget_collection(&self.store.collection().to_string())
            .await?;
        Ok(())
    }

    #[inline]
    pub async fn collections(&self) -> Result<Vec<String>> {
        self.store.collections().await
    }

    #[inline]
    pub async fn delete_collection(&mut self, name: &str) -> Result<()> {
        self.store.delete_collection(name).await?;
        self.catalog.forget_collection(name).await?;
        Ok(())
    }

    #[inline]
    pub async fn stats(&self) -> Result<GraphPipelineStats> {
        let entities = self.store.get_all_entities().await?;
        let relations = self.store.get_all_relations().await?;

        let top_entities: Vec<(String, usize)> = entities
            .iter()
            .map(|(name, count)| (name.clone(), *count))
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
            .take(10)
            .collect();

        Ok(GraphPipelineStats {
            base: PipelineStats {
                collection: self.store.collection().to_string(),
                total_chunks: self.store.len().await?,
                total_documents: self.catalog.document_count(self.store.collection()).await?,
                embedding_model: self.embeddings.model_name().to_string(),
                embedding_dimension: self.embeddings.dimension(),
                generation_model: self.generation.model_name().to_string(),
                chunk_size: self.chunker.chunk_size(),
                chunk_overlap: self.chunker.chunk_overlap(),
            },
            total_entities: entities.len(),
            total_relations: relations.len(),
            top_entities,
        })
    }
}

/// Chunk every document, tagging each chunk with its parent's origin.
/// Returns the chunk list plus per-document chunk counts.
fn chunk_documents(
    chunker: &TextChunker,
    documents: &[SourceDocument],
) -> (Vec<SourceDocument>, Vec<usize>) {
    let mut chunks = Vec::new();
    let mut per_document = Vec::with_capacity(documents.len());

    for document in documents {
        let texts = chunker.chunk(&document.content);
        per_document.push(texts.len());
        for text in texts {
            chunks.push(SourceDocument::new(
                text,
                document.source.clone(),
                document.doc_type,
            ));
        }
    }

    (chunks, per_document)
}

/// Refuse to touch a collection whose catalog row names a different
/// embedding setup than the active provider.
async fn verify_provider(
    catalog: &Database,
    collection: &str,
    provider: &dyn EmbeddingProvider,
) -> Result<()> {
    let Some(record) = catalog.get_collection(collection).await? else {
        return Ok(());
    };

    if record.dimension != provider.dimension() as i64 {
        return Err(RagError::DimensionMismatch {
            expected: record.dimension as usize,
            actual: provider.dimension(),
        });
    }

    if record.embedding_model != provider.model_name() {
        return Err(RagError::Config(format!(
            "Collection {:?} was created with embedding model {:?}; active provider is {:?}",
            collection, record.embedding_model, provider.model_name()
        )));
    }

    Ok(())
}

/// Register the collection on first ingest and record one catalog row per
/// source document.
async fn record_ingestion(
    catalog: &Database,
    collection: &str,
    provider: &dyn EmbeddingProvider,
    documents: &[SourceDocument],
    per_document: &[usize],
) -> Result<()> {
    if catalog.get_collection(collection).await?.is_none() {
        catalog
            .register_collection(collection, provider.model_name(), provider.dimension())
            .await?;
    }

    for (document, chunk_count) in documents.iter().zip(per_document) {
        if *chunk_count == 0 {
            continue;
        }
        catalog
            .record_document(NewDocument {
                collection: collection.to_string(),
                source: document.source.clone(),
                doc_type: document.doc_type.as_str().to_string(),
                chunk_count: *chunk_count as i64,
            })
            .await?;
    }

    Ok(())
}

/// Concatenate retrieved chunks into the answer context block.
fn build_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| format!("[Source: {}]\n{}", r.source, r.content))
        .join("\n\n")
}

fn render_answer_prompt(context: &str, question: &str) -> String {
    format!("Context:\n{}\n\nQuestion: {}\n\nAnswer:", context, question)
}
