use super::*;
use tempfile::TempDir;

#[test]
fn default_config_is_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.collection, DEFAULT_COLLECTION);
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::OpenAi);
}

#[test]
fn load_missing_file_uses_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Config::load(temp_dir.path()).expect("should load defaults");

    assert_eq!(config.base_dir, temp_dir.path());
    assert_eq!(config.chunking.chunk_size, 1000);
    assert_eq!(config.chunking.chunk_overlap, 200);
    assert!(config.graph.enabled);
}

#[test]
fn save_and_reload_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let mut config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    config.embedding.provider = EmbeddingProviderKind::Ollama;
    config.chunking.chunk_size = 800;
    config.chunking.chunk_overlap = 100;
    config.collection = "research_notes".to_string();

    config.save().expect("should save config");

    let reloaded = Config::load(temp_dir.path()).expect("should reload config");
    assert_eq!(reloaded.embedding.provider, EmbeddingProviderKind::Ollama);
    assert_eq!(reloaded.chunking.chunk_size, 800);
    assert_eq!(reloaded.collection, "research_notes");
}

#[test]
fn partial_toml_fills_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[embedding]\nprovider = \"voyage\"\n",
    )
    .expect("should write config file");

    let config = Config::load(temp_dir.path()).expect("should load config");
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::Voyage);
    assert_eq!(config.embedding.voyage.model, "voyage-3");
    assert_eq!(config.generation.model, "gpt-4o-mini");
}

#[test]
fn rejects_overlap_at_or_above_chunk_size() {
    let mut config = Config::default();
    config.chunking.chunk_size = 200;
    config.chunking.chunk_overlap = 200;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::OverlapTooLarge(200, 200))
    ));

    config.chunking.chunk_overlap = 500;
    assert!(config.validate().is_err());
}

#[test]
fn rejects_zero_chunk_size() {
    let mut config = Config::default();
    config.chunking.chunk_size = 0;
    config.chunking.chunk_overlap = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidChunkSize(0))
    ));
}

#[test]
fn rejects_empty_collection_name() {
    let config = Config {
        collection: "  ".to_string(),
        ..Config::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidCollection(_))
    ));
}

#[test]
fn ollama_validation() {
    let mut ollama = OllamaConfig::default();
    assert!(ollama.validate().is_ok());

    ollama.protocol = "ftp".to_string();
    assert!(matches!(
        ollama.validate(),
        Err(ConfigError::InvalidProtocol(_))
    ));

    ollama.protocol = "http".to_string();
    ollama.port = 0;
    assert!(matches!(ollama.validate(), Err(ConfigError::InvalidPort(0))));

    ollama.port = 11434;
    ollama.embedding_dimension = 10;
    assert!(matches!(
        ollama.validate(),
        Err(ConfigError::InvalidEmbeddingDimension(10))
    ));
}

#[test]
fn ollama_endpoint_url() {
    let ollama = OllamaConfig::default();
    let url = ollama.endpoint().expect("should build endpoint");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn generation_validation() {
    let mut generation = GenerationConfig::default();
    assert!(generation.validate().is_ok());

    generation.max_tokens = 0;
    assert!(matches!(
        generation.validate(),
        Err(ConfigError::InvalidMaxTokens(0))
    ));

    generation.max_tokens = 500;
    generation.model = String::new();
    assert!(matches!(
        generation.validate(),
        Err(ConfigError::InvalidModel(_))
    ));
}

#[test]
fn storage_paths() {
    let config = Config {
        base_dir: std::path::PathBuf::from("/tmp/ragkit-test"),
        ..Config::default()
    };
    assert_eq!(
        config.catalog_path(),
        std::path::PathBuf::from("/tmp/ragkit-test/catalog.db")
    );
    assert_eq!(
        config.vector_database_path(),
        std::path::PathBuf::from("/tmp/ragkit-test/vectors")
    );
}
