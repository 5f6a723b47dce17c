
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use fancy_regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::generation::GenerationProvider;
use crate::graph::{Entity, GraphData, GraphMetadata, Relation};
use crate::{RagError, Result};

const EXTRACTION_SYSTEM_PROMPT: &str =
    "You are a knowledge graph extraction expert. Return only valid JSON.";

const EXTRACTION_MAX_TOKENS: u32 = 1000;

/// Stopwords dropped during keyword extraction
const STOPWORDS: [&str; 25] = [
    "the", "is", "at", "which", "on", "a", "an", "and", "or", "but", "in", "with", "to", "for",
    "of", "as", "by", "this", "that", "it", "from", "be", "are", "was", "were",
];

/// Lexical relation patterns applied independently to the text
const RELATION_PATTERNS: [(&str, &str); 5] = [
    (
        r"(?i)(\w+(?:\s+\w+)?)\s+is\s+(?:a|an)\s+(\w+(?:\s+\w+)?)",
        "is_a",
    ),
    (r"(?i)(\w+(?:\s+\w+)?)\s+has\s+(\w+(?:\s+\w+)?)", "has"),
    (r"(?i)(\w+(?:\s+\w+)?)\s+uses\s+(\w+(?:\s+\w+)?)", "uses"),
    (
        r"(?i)(\w+(?:\s+\w+)?)\s+contains\s+(\w+(?:\s+\w+)?)",
        "contains",
    ),
    (
        r"(?i)(\w+(?:\s+\w+)?)\s+requires\s+(\w+(?:\s+\w+)?)",
        "requires",
    ),
];

#[derive(Debug, Deserialize)]
struct LlmGraph {
    #[serde(default)]
    entities: Vec<LlmEntity>,
    #[serde(default)]
    relations: Vec<LlmRelation>,
}

#[derive(Debug, Deserialize)]
struct LlmEntity {
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default = "unknown_type")]
    entity_type: String,
}

fn unknown_type() -> String {
    "unknown".to_string()
}

#[derive(Debug, Deserialize)]
struct LlmRelation {
    #[serde(default)]
    source: String,
    #[serde(default)]
    relation: String,
    #[serde(default)]
    target: String,
}

/// Derives entities and relations from chunk text.
///
/// When a generation client is attached, extraction goes through the LLM
/// with a structured-output prompt; any failure on that path degrades to the
/// deterministic pattern strategy for that chunk, so extraction never fails
/// an ingestion.
pub struct GraphExtractor {
    llm: Option<Arc<dyn GenerationProvider>>,
    max_keywords: usize,
    entity_pattern: Regex,
    relation_patterns: Vec<(Regex, &'static str)>,
    keyword_pattern: Regex,
}

impl GraphExtractor {
    #[inline]
    pub fn new(max_keywords: usize) -> Result<Self> {
        let entity_pattern = Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b")
            .map_err(|e| RagError::Extraction(format!("Invalid entity pattern: {}", e)))?;

        let mut relation_patterns = Vec::with_capacity(RELATION_PATTERNS.len());
        for (pattern, label) in RELATION_PATTERNS {
            let regex = Regex::new(pattern)
                .map_err(|e| RagError::Extraction(format!("Invalid relation pattern: {}", e)))?;
            relation_patterns.push((regex, label));
        }

        let keyword_pattern = Regex::new(r"\b[a-z]{3,}\b")
            .map_err(|e| RagError::Extraction(format!("Invalid keyword pattern: {}", e)))?;

        Ok(Self {
            llm: None,
            max_keywords,
            entity_pattern,
            relation_patterns,
            keyword_pattern,
        })
    }

    /// Attach a generation client for LLM-based extraction.
    #[inline]
    pub fn with_llm(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.llm = Some(provider);
        self
    }

    #[inline]
    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    /// Extract entities and relations, degrading from the LLM strategy to
    /// pattern matching on any failure.
    #[inline]
    pub fn extract(&self, text: &str) -> GraphData {
        if self.llm.is_some() {
            match self.extract_with_llm(text) {
                Ok(data) => return data,
                Err(e) => {
                    warn!(
                        "LLM graph extraction failed ({}), falling back to pattern matching",
                        e
                    );
                }
            }
        }

        self.extract_with_patterns(text)
    }

    /// LLM-based extraction; the error carries why the structured output
    /// could not be obtained.
    fn extract_with_llm(&self, text: &str) -> Result<GraphData> {
        let llm = self
            .llm
            .as_ref()
            .ok_or_else(|| RagError::Extraction("No generation client attached".to_string()))?;

        let prompt = format!(
            "Extract entities and relationships from the following text.\n\n\
             Return a JSON object with:\n\
             1. \"entities\": list of objects with \"name\", \"type\" (person, organization, location, concept, etc.)\n\
             2. \"relations\": list of objects with \"source\", \"relation\", \"target\"\n\n\
             Text: {}\n\n\
             Return ONLY valid JSON, no markdown formatting.",
            text
        );

        let response = llm
            .complete(EXTRACTION_SYSTEM_PROMPT, &prompt, EXTRACTION_MAX_TOKENS, 0.0)
            .map_err(|e| RagError::Extraction(e.to_string()))?;

        let parsed: LlmGraph = serde_json::from_str(response.trim())
            .map_err(|e| RagError::Extraction(format!("Malformed extraction JSON: {}", e)))?;

        let entities = parsed
            .entities
            .into_iter()
            .filter(|e| !e.name.is_empty())
            .map(|e| Entity {
                name: e.name,
                entity_type: e.entity_type,
            })
            .collect();

        let relations = parsed
            .relations
            .into_iter()
            .map(|r| Relation::new(r.source, r.relation, r.target))
            .collect();

        Ok(GraphData {
            entities,
            relations,
        })
    }

    /// Deterministic pattern-based extraction.
    ///
    /// Entities are distinct capitalized phrases longer than two characters,
    /// in first-seen order. Relations come from the fixed lexical patterns,
    /// applied independently with no cross-pattern deduplication.
    #[inline]
    pub fn extract_with_patterns(&self, text: &str) -> GraphData {
        let mut entities = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for capture in self.entity_pattern.find_iter(text).flatten() {
            let name = capture.as_str();
            if name.chars().count() > 2 && seen.insert(name.to_string()) {
                entities.push(Entity {
                    name: name.to_string(),
                    entity_type: "entity".to_string(),
                });
            }
        }

        let mut relations = Vec::new();
        for (pattern, label) in &self.relation_patterns {
            for captures in pattern.captures_iter(text).flatten() {
                let source = captures.get(1).map(|m| m.as_str().trim());
                let target = captures.get(2).map(|m| m.as_str().trim());
                if let (Some(source), Some(target)) = (source, target) {
                    relations.push(Relation::new(source, *label, target));
                }
            }
        }

        debug!(
            "Pattern extraction found {} entities, {} relations",
            entities.len(),
            relations.len()
        );

        GraphData {
            entities,
            relations,
        }
    }

    /// Frequency-based keyword extraction: lowercase tokens of three or more
    /// letters, stopwords removed, ordered by descending frequency with ties
    /// broken by first appearance.
    #[inline]
    pub fn extract_keywords(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();

        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for token in self.keyword_pattern.find_iter(&lowered).flatten() {
            let word = token.as_str();
            if STOPWORDS.contains(&word) {
                continue;
            }
            match counts.get_mut(word) {
                Some(count) => *count += 1,
                None => {
                    counts.insert(word.to_string(), 1);
                    order.push(word.to_string());
                }
            }
        }

        // Stable sort keeps first-appearance order within equal counts
        order.sort_by(|a, b| counts[b].cmp(&counts[a]));
        order.truncate(self.max_keywords);
        order
    }

    /// Build the per-chunk metadata stored alongside the vector record.
    #[inline]
    pub fn build_graph_metadata(&self, text: &str, chunk_id: &str) -> GraphMetadata {
        let data = self.extract(text);
        let keywords = self.extract_keywords(text);
        GraphMetadata::from_extraction(chunk_id, &data, keywords)
    }
}
