// Configuration management module
// Handles TOML configuration loading, validation, and storage paths

pub mod settings;


pub use settings::{
    Config, ConfigError, EmbeddingConfig, EmbeddingProviderKind, GenerationConfig, GraphConfig,
    OllamaConfig, OpenAiConfig, VoyageConfig,
};

/// Default base directory for persisted data (`~/.local/share/ragkit` or the
/// platform equivalent), falling back to the current directory.
#[inline]
pub fn default_base_dir() -> std::path::PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("ragkit"))
        .unwrap_or_else(|| std::path::PathBuf::from(".ragkit"))
}
