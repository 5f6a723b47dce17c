use super::*;
use crate::graph::{Entity, GraphData};
use crate::loader::{DocumentType, SourceDocument};
use tempfile::TempDir;

fn doc(content: &str) -> SourceDocument {
    SourceDocument::new(content, "/docs/notes.txt", DocumentType::Txt)
}

fn vector(seed: f32) -> Vec<f32> {
    vec![seed, 0.2, 0.3, 0.4]
}

fn metadata(chunk_id: &str, entities: &[&str], relations: &[(&str, &str, &str)]) -> GraphMetadata {
    let data = GraphData {
        entities: entities
            .iter()
            .map(|name| Entity {
                name: (*name).to_string(),
                entity_type: "entity".to_string(),
            })
            .collect(),
        relations: relations
            .iter()
            .map(|(s, l, t)| Relation::new(*s, *l, *t))
            .collect(),
    };
    GraphMetadata::from_extraction(chunk_id, &data, vec!["keyword".to_string()])
}

async fn open_store(temp_dir: &TempDir) -> GraphVectorStore {
    GraphVectorStore::open(temp_dir.path().join("vectors"), "graph_collection")
        .await
        .expect("should open graph store")
}

/// Two chunks forming the chain A -r1-> B -r2-> C, plus one chunk with no
/// graph signal
async fn seed_chain(store: &mut GraphVectorStore) {
    let documents = vec![
        doc("A relates to B"),
        doc("B relates to C"),
        doc("no graph data here"),
    ];
    let vectors = vec![vector(0.1), vector(0.5), vector(0.9)];
    let graph = vec![
        metadata("chunk_0", &["A", "B"], &[("A", "r1", "B")]),
        metadata("chunk_1", &["B", "C"], &[("B", "r2", "C")]),
        GraphMetadata::default(),
    ];

    store
        .add_with_graph(&documents, &vectors, Some(&graph))
        .await
        .expect("should add records with graph metadata");
}

#[tokio::test]
async fn search_carries_graph_metadata() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut store = open_store(&temp_dir).await;
    seed_chain(&mut store).await;

    let results = store
        .search(&vector(0.1), 3)
        .await
        .expect("search should succeed");
    assert_eq!(results.len(), 3);

    let hit = results
        .iter()
        .find(|r| r.content == "A relates to B")
        .expect("seeded chunk should be found");
    let graph = hit.graph.as_ref().expect("hit should carry graph metadata");
    assert_eq!(graph.entities, vec!["A", "B"]);
    assert_eq!(graph.relations, vec!["A|r1|B"]);
    assert!(graph.has_graph_data);

    let no_graph = results
        .iter()
        .find(|r| r.content == "no graph data here")
        .expect("chunk without graph should be found");
    assert!(no_graph.graph.is_none());
}

#[tokio::test]
async fn add_without_graph_still_searchable() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut store = open_store(&temp_dir).await;

    store
        .add(&[doc("plain record")], &[vector(0.3)])
        .await
        .expect("should add record");

    let results = store
        .search(&vector(0.3), 1)
        .await
        .expect("search should succeed");
    assert_eq!(results.len(), 1);
    assert!(results[0].graph.is_none());
}

#[tokio::test]
async fn find_by_entity_exact_membership() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut store = open_store(&temp_dir).await;
    seed_chain(&mut store).await;

    let matches = store
        .find_by_entity("B", 10)
        .await
        .expect("lookup should succeed");
    assert_eq!(matches.len(), 2);
    for chunk in &matches {
        let graph = chunk.graph.as_ref().expect("match should carry graph");
        assert!(graph.entities.iter().any(|e| e == "B"));
    }

    let single = store
        .find_by_entity("B", 1)
        .await
        .expect("lookup should succeed");
    assert_eq!(single.len(), 1);

    let missing = store
        .find_by_entity("Zed", 10)
        .await
        .expect("lookup should succeed");
    assert!(missing.is_empty());
}

#[tokio::test]
async fn entity_counts_are_chunk_memberships() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut store = open_store(&temp_dir).await;
    seed_chain(&mut store).await;

    let entities = store
        .get_all_entities()
        .await
        .expect("aggregation should succeed");

    assert_eq!(entities.get("A"), Some(&1));
    assert_eq!(entities.get("B"), Some(&2));
    assert_eq!(entities.get("C"), Some(&1));
    assert_eq!(entities.len(), 3);
}

#[tokio::test]
async fn relations_are_deduplicated() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut store = open_store(&temp_dir).await;

    // The same relation appears in two chunks
    let documents = vec![doc("first"), doc("second")];
    let vectors = vec![vector(0.1), vector(0.2)];
    let graph = vec![
        metadata("chunk_0", &["X", "Y"], &[("X", "links", "Y")]),
        metadata("chunk_1", &["X", "Y"], &[("X", "links", "Y")]),
    ];
    store
        .add_with_graph(&documents, &vectors, Some(&graph))
        .await
        .expect("should add records");

    let relations = store
        .get_all_relations()
        .await
        .expect("aggregation should succeed");
    assert_eq!(relations, vec![Relation::new("X", "links", "Y")]);
}

#[tokio::test]
async fn traverse_single_hop() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut store = open_store(&temp_dir).await;
    seed_chain(&mut store).await;

    let traversal = store.traverse("A", 1).await.expect("traversal should succeed");

    assert_eq!(traversal.entities, vec!["A", "B"]);
    assert_eq!(traversal.relations, vec![Relation::new("A", "r1", "B")]);
    assert_eq!(traversal.hops, 1);
}

#[tokio::test]
async fn traverse_two_hops_reaches_chain_end() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut store = open_store(&temp_dir).await;
    seed_chain(&mut store).await;

    let traversal = store.traverse("A", 2).await.expect("traversal should succeed");

    assert_eq!(traversal.entities, vec!["A", "B", "C"]);
    assert_eq!(
        traversal.relations,
        vec![Relation::new("A", "r1", "B"), Relation::new("B", "r2", "C")]
    );
    assert_eq!(traversal.hops, 2);
}

#[tokio::test]
async fn traverse_follows_edges_backwards() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut store = open_store(&temp_dir).await;
    seed_chain(&mut store).await;

    // C is only a relation target; traversal still reaches B through it
    let traversal = store.traverse("C", 1).await.expect("traversal should succeed");
    assert_eq!(traversal.entities, vec!["C", "B"]);
    assert_eq!(traversal.relations, vec![Relation::new("B", "r2", "C")]);
}

#[tokio::test]
async fn traverse_unknown_entity() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut store = open_store(&temp_dir).await;
    seed_chain(&mut store).await;

    let traversal = store
        .traverse("Nowhere", 3)
        .await
        .expect("traversal should succeed");

    assert_eq!(traversal.entities, vec!["Nowhere"]);
    assert!(traversal.relations.is_empty());
    assert_eq!(traversal.hops, 0);
}

#[tokio::test]
async fn traverse_stops_early_when_frontier_empties() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut store = open_store(&temp_dir).await;
    seed_chain(&mut store).await;

    // The chain is exhausted after two hops even with a larger budget
    let traversal = store.traverse("A", 10).await.expect("traversal should succeed");
    assert_eq!(traversal.entities, vec!["A", "B", "C"]);
    assert_eq!(traversal.hops, 2);
}

#[tokio::test]
async fn graph_queries_on_empty_collection() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store = open_store(&temp_dir).await;

    assert!(store.get_all_entities().await.expect("ok").is_empty());
    assert!(store.get_all_relations().await.expect("ok").is_empty());
    assert!(store.find_by_entity("A", 5).await.expect("ok").is_empty());

    let traversal = store.traverse("A", 2).await.expect("ok");
    assert_eq!(traversal.entities, vec!["A"]);
    assert_eq!(traversal.hops, 0);
}
