// Knowledge graph module
// Entities and relations extracted per chunk, stored alongside vector records

#[cfg(test)]
mod tests;

pub mod extractor;

use serde::{Deserialize, Serialize};

pub use extractor::GraphExtractor;

/// A named concept extracted from text, used as a graph node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub entity_type: String,
}

/// A labeled directed edge between two entities, derived from one chunk
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub source: String,
    pub label: String,
    pub target: String,
}

impl Relation {
    #[inline]
    pub fn new(
        source: impl Into<String>,
        label: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            label: label.into(),
            target: target.into(),
        }
    }

    /// Encode as the `"source|label|target"` storage form.
    ///
    /// This encoding is a durable contract: persisted collections depend on
    /// the `|` delimiter.
    #[inline]
    pub fn encode(&self) -> String {
        format!("{}|{}|{}", self.source, self.label, self.target)
    }

    /// Parse the `"source|label|target"` storage form; anything without
    /// exactly three parts is rejected.
    #[inline]
    pub fn parse(encoded: &str) -> Option<Self> {
        let mut parts = encoded.split('|');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(source), Some(label), Some(target), None) => {
                Some(Self::new(source, label, target))
            }
            _ => None,
        }
    }

    /// Whether `entity` appears as either endpoint
    #[inline]
    pub fn touches(&self, entity: &str) -> bool {
        self.source == entity || self.target == entity
    }
}

/// Entities and relations extracted from one chunk's text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphData {
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
}

impl GraphData {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }
}

/// Per-chunk graph metadata in its storage shape: entity names with aligned
/// type tags, encoded relation strings, and auxiliary keywords
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub chunk_id: String,
    pub entities: Vec<String>,
    pub entity_types: Vec<String>,
    pub relations: Vec<String>,
    pub keywords: Vec<String>,
    pub has_graph_data: bool,
}

impl GraphMetadata {
    /// Assemble metadata for one chunk from extracted graph data and
    /// keywords.
    #[inline]
    pub fn from_extraction(chunk_id: &str, data: &GraphData, keywords: Vec<String>) -> Self {
        Self {
            chunk_id: chunk_id.to_string(),
            entities: data.entities.iter().map(|e| e.name.clone()).collect(),
            entity_types: data
                .entities
                .iter()
                .map(|e| e.entity_type.clone())
                .collect(),
            relations: data.relations.iter().map(Relation::encode).collect(),
            keywords,
            has_graph_data: !data.is_empty(),
        }
    }

    /// Decode the stored relation strings, skipping malformed entries.
    #[inline]
    pub fn decoded_relations(&self) -> Vec<Relation> {
        self.relations
            .iter()
            .filter_map(|r| Relation::parse(r))
            .collect()
    }
}

/// Result of a bounded breadth-first traversal of the relation graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphTraversal {
    pub entities: Vec<String>,
    pub relations: Vec<Relation>,
    /// Hops actually completed before the frontier emptied
    pub hops: usize,
}
