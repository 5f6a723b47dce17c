use super::*;

#[test]
fn search_result_shape() {
    let result = SearchResult {
        content: "chunk text".to_string(),
        source: "/docs/file.txt".to_string(),
        doc_type: DocumentType::Txt,
        chunk_id: "id-1".to_string(),
        score: 0.92,
        graph: None,
    };

    assert_eq!(result.doc_type.as_str(), "txt");
    assert!(result.graph.is_none());
}

#[test]
fn stored_chunk_graph_round_trip() {
    let metadata = GraphMetadata {
        chunk_id: "id-2".to_string(),
        entities: vec!["Python".to_string()],
        entity_types: vec!["entity".to_string()],
        relations: vec!["Python|is_a|language".to_string()],
        keywords: vec!["python".to_string()],
        has_graph_data: true,
    };

    let chunk = StoredChunk {
        content: "Python is a language".to_string(),
        source: "/docs/python.md".to_string(),
        doc_type: DocumentType::Markdown,
        chunk_id: "id-2".to_string(),
        graph: Some(metadata),
    };

    let decoded = chunk
        .graph
        .as_ref()
        .expect("graph present")
        .decoded_relations();
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].source, "Python");
}
