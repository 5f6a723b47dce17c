use super::*;
use tempfile::TempDir;

#[tokio::test]
async fn database_facade_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let database = Database::new(temp_dir.path().join("catalog.db"))
        .await
        .expect("should create database");

    let collection = database
        .register_collection("notes", "voyage-3", 1024)
        .await
        .expect("should register collection");
    assert_eq!(collection.embedding_model, "voyage-3");
    assert_eq!(collection.dimension, 1024);

    database
        .record_document(NewDocument {
            collection: "notes".to_string(),
            source: "/docs/a.md".to_string(),
            doc_type: "markdown".to_string(),
            chunk_count: 7,
        })
        .await
        .expect("should record document");

    assert_eq!(
        database
            .document_count("notes")
            .await
            .expect("should count"),
        1
    );

    let fetched = database
        .get_collection("notes")
        .await
        .expect("should fetch")
        .expect("collection exists");
    assert_eq!(fetched.name, "notes");

    database
        .forget_collection("notes")
        .await
        .expect("should forget collection");
    assert!(
        database
            .get_collection("notes")
            .await
            .expect("should fetch")
            .is_none()
    );
    assert_eq!(
        database
            .document_count("notes")
            .await
            .expect("should count"),
        0
    );
}

#[tokio::test]
async fn schema_creation_is_idempotent() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("catalog.db");

    let first = Database::new(&path).await.expect("should create database");
    first
        .register_collection("kept", "model", 8)
        .await
        .expect("should register");
    drop(first);

    // Reopening runs the DDL again and keeps existing rows
    let second = Database::new(&path).await.expect("should reopen database");
    let kept = second
        .get_collection("kept")
        .await
        .expect("should fetch")
        .expect("row survived reopen");
    assert_eq!(kept.dimension, 8);
}
