use super::*;

#[test]
fn relation_encoding_round_trip() {
    let relation = Relation::new("Python", "is_a", "programming language");
    let encoded = relation.encode();
    assert_eq!(encoded, "Python|is_a|programming language");
    assert_eq!(Relation::parse(&encoded), Some(relation));
}

#[test]
fn relation_parse_rejects_malformed() {
    assert_eq!(Relation::parse("only|two"), None);
    assert_eq!(Relation::parse("a|b|c|d"), None);
    assert_eq!(Relation::parse(""), None);
}

#[test]
fn relation_touches_either_endpoint() {
    let relation = Relation::new("A", "r1", "B");
    assert!(relation.touches("A"));
    assert!(relation.touches("B"));
    assert!(!relation.touches("C"));
}

#[test]
fn metadata_from_extraction() {
    let data = GraphData {
        entities: vec![
            Entity {
                name: "Rust".to_string(),
                entity_type: "concept".to_string(),
            },
            Entity {
                name: "Mozilla".to_string(),
                entity_type: "organization".to_string(),
            },
        ],
        relations: vec![Relation::new("Mozilla", "uses", "Rust")],
    };

    let metadata =
        GraphMetadata::from_extraction("chunk_3", &data, vec!["systems".to_string()]);

    assert_eq!(metadata.chunk_id, "chunk_3");
    assert_eq!(metadata.entities, vec!["Rust", "Mozilla"]);
    assert_eq!(metadata.entity_types, vec!["concept", "organization"]);
    assert_eq!(metadata.relations, vec!["Mozilla|uses|Rust"]);
    assert_eq!(metadata.keywords, vec!["systems"]);
    assert!(metadata.has_graph_data);

    let decoded = metadata.decoded_relations();
    assert_eq!(decoded, vec![Relation::new("Mozilla", "uses", "Rust")]);
}

#[test]
fn empty_extraction_has_no_graph_data() {
    let metadata = GraphMetadata::from_extraction("chunk_0", &GraphData::default(), Vec::new());
    assert!(!metadata.has_graph_data);
    assert!(metadata.decoded_relations().is_empty());
}
