#[cfg(test)]
mod tests;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::debug;

use super::{SearchResult, StoredChunk, VectorStore};
use crate::graph::{GraphMetadata, GraphTraversal, Relation};
use crate::loader::SourceDocument;
use crate::Result;

/// Vector store variant that persists per-chunk graph metadata alongside
/// each record and answers graph queries over it.
///
/// Entity and relation aggregates are recomputed from the stored per-chunk
/// metadata on demand; there is no standalone entity table.
pub struct GraphVectorStore {
    store: VectorStore,
}

impl GraphVectorStore {
    /// Open the graph-enhanced store for `collection` under `db_dir`.
    #[inline]
    pub async fn open<P: AsRef<Path>>(db_dir: P, collection: &str) -> Result<Self> {
        let store = VectorStore::open_inner(db_dir.as_ref(), collection, true).await?;
        Ok(Self { store })
    }

    #[inline]
    pub fn collection(&self) -> &str {
        self.store.collection()
    }

    #[inline]
    pub fn dimension(&self) -> Option<usize> {
        self.store.dimension()
    }

    /// Add documents without graph metadata; the records still participate
    /// in vector search but contribute nothing to graph queries.
    #[inline]
    pub async fn add(
        &mut self,
        documents: &[SourceDocument],
        vectors: &[Vec<f32>],
    ) -> Result<usize> {
        self.store.add_records(documents, vectors, None).await
    }

    /// Add documents with per-chunk graph metadata aligned by index.
    ///
    /// Positions past the end of the metadata slice are stored with empty
    /// graph columns, exactly like records added without graph data.
    #[inline]
    pub async fn add_with_graph(
        &mut self,
        documents: &[SourceDocument],
        vectors: &[Vec<f32>],
        graph_metadata: Option<&[GraphMetadata]>,
    ) -> Result<usize> {
        self.store
            .add_records(documents, vectors, graph_metadata)
            .await
    }

    /// Similarity search; hits carry their graph metadata when present.
    #[inline]
    pub async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        self.store.search(query_vector, top_k).await
    }

    #[inline]
    pub async fn len(&self) -> Result<usize> {
        self.store.len().await
    }

    #[inline]
    pub async fn clear(&mut self) -> Result<()> {
        self.store.clear().await
    }

    #[inline]
    pub async fn collections(&self) -> Result<Vec<String>> {
        self.store.collections().await
    }

    #[inline]
    pub async fn delete_collection(&mut self, name: &str) -> Result<()> {
        self.store.delete_collection(name).await
    }

    /// Find chunks whose entity list contains `entity` exactly.
    ///
    /// The scan runs in storage order and stops after `top_k` matches; an
    /// unknown entity yields an empty result.
    #[inline]
    pub async fn find_by_entity(&self, entity: &str, top_k: usize) -> Result<Vec<StoredChunk>> {
        let mut matches = Vec::new();

        for chunk in self.store.scan_all().await? {
            let contains = chunk
                .graph
                .as_ref()
                .is_some_and(|g| g.entities.iter().any(|e| e == entity));
            if contains {
                matches.push(chunk);
                if matches.len() >= top_k {
                    break;
                }
            }
        }

        Ok(matches)
    }

    /// Aggregate entity occurrence counts across all stored chunks.
    ///
    /// An entity's count is the number of chunk entity-list memberships, not
    /// raw in-text occurrences; extraction deduplicates per chunk.
    #[inline]
    pub async fn get_all_entities(&self) -> Result<HashMap<String, usize>> {
        let mut counts: HashMap<String, usize> = HashMap::new();

        for chunk in self.store.scan_all().await? {
            if let Some(graph) = &chunk.graph {
                for entity in &graph.entities {
                    *counts.entry(entity.clone()).or_insert(0) += 1;
                }
            }
        }

        Ok(counts)
    }

    /// The deduplicated union of relations across all stored chunks, in
    /// first-seen storage order.
    #[inline]
    pub async fn get_all_relations(&self) -> Result<Vec<Relation>> {
        let mut seen: HashSet<Relation> = HashSet::new();
        let mut relations = Vec::new();

        for chunk in self.store.scan_all().await? {
            if let Some(graph) = &chunk.graph {
                for relation in graph.decoded_relations() {
                    if seen.insert(relation.clone()) {
                        relations.push(relation);
                    }
                }
            }
        }

        Ok(relations)
    }

    /// Breadth-first expansion over the relation graph from `start_entity`,
    /// bounded by `max_hops`.
    ///
    /// Relations in the output are deduplicated, matching
    /// [`get_all_relations`](Self::get_all_relations). `hops` reports the
    /// hops actually completed before the frontier emptied.
    #[inline]
    pub async fn traverse(&self, start_entity: &str, max_hops: usize) -> Result<GraphTraversal> {
        let all_relations = self.get_all_relations().await?;

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(start_entity.to_string());
        let mut entities = vec![start_entity.to_string()];

        let mut frontier: HashSet<String> = visited.clone();
        let mut seen_relations: HashSet<Relation> = HashSet::new();
        let mut relations = Vec::new();
        let mut hops = 0;

        for hop in 0..max_hops {
            let mut reached: HashSet<String> = HashSet::new();

            for relation in &all_relations {
                let other = if frontier.contains(&relation.source) {
                    Some(relation.target.clone())
                } else if frontier.contains(&relation.target) {
                    Some(relation.source.clone())
                } else {
                    None
                };

                if let Some(other) = other {
                    reached.insert(other);
                    if seen_relations.insert(relation.clone()) {
                        relations.push(relation.clone());
                    }
                }
            }

            let mut new_frontier: Vec<String> = reached
                .into_iter()
                .filter(|e| !visited.contains(e))
                .collect();
            new_frontier.sort();

            if new_frontier.is_empty() {
                hops = hop;
                break;
            }

            for entity in &new_frontier {
                visited.insert(entity.clone());
                entities.push(entity.clone());
            }
            frontier = new_frontier.into_iter().collect();
            hops = hop + 1;
        }

        debug!(
            "Traversal from {:?} reached {} entities over {} hops",
            start_entity,
            entities.len(),
            hops
        );

        Ok(GraphTraversal {
            entities,
            relations,
            hops,
        })
    }
}
