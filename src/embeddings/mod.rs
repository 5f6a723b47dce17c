// Embeddings module
// Pluggable providers mapping text to fixed-dimension vectors


pub mod ollama;
pub mod openai;
pub mod voyage;

use std::time::Duration;

use tracing::{debug, error, warn};

use crate::config::{EmbeddingConfig, EmbeddingProviderKind};
use crate::{RagError, Result};

pub use ollama::OllamaEmbeddings;
pub use openai::OpenAiEmbeddings;
pub use voyage::VoyageEmbeddings;

pub(crate) const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub(crate) const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// A component mapping text to fixed-dimension vectors for similarity
/// comparison.
///
/// All vectors produced by one provider instance share [`dimension`]
/// components; a collection must only ever be fed vectors from one provider.
///
/// [`dimension`]: EmbeddingProvider::dimension
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, batching requests as the
    /// backing service requires.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Number of components in every vector this provider produces.
    fn dimension(&self) -> usize;

    /// Identifier of the backing model.
    fn model_name(&self) -> &str;
}

/// Construct the embedding provider selected by the configuration.
///
/// Credentials are resolved lazily: construction succeeds without an API key,
/// and the first embed call reports the missing credential.
#[inline]
pub fn provider_from_config(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider {
        EmbeddingProviderKind::OpenAi => {
            Ok(Box::new(OpenAiEmbeddings::new(config.openai.clone(), None)?))
        }
        EmbeddingProviderKind::Ollama => {
            Ok(Box::new(OllamaEmbeddings::new(config.ollama.clone())?))
        }
        EmbeddingProviderKind::Voyage => {
            Ok(Box::new(VoyageEmbeddings::new(config.voyage.clone(), None)?))
        }
    }
}

pub(crate) fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

/// Resolve an API key: explicit value first, then the environment.
pub(crate) fn resolve_api_key(
    explicit: Option<&str>,
    env_var: &str,
    provider: &str,
) -> Result<String> {
    if let Some(key) = explicit {
        return Ok(key.to_string());
    }

    std::env::var(env_var).map_err(|_| {
        RagError::Embedding(format!(
            "{} API key required: set {} or pass an explicit key",
            provider, env_var
        ))
    })
}

/// Run an HTTP request with retries and exponential backoff.
///
/// Server errors (5xx) and transport failures are retried; client errors are
/// returned immediately.
pub(crate) fn request_with_retry<F>(retry_attempts: u32, mut request_fn: F) -> Result<String>
where
    F: FnMut() -> std::result::Result<String, ureq::Error>,
{
    let mut last_error = None;

    for attempt in 1..=retry_attempts {
        debug!("HTTP request attempt {}/{}", attempt, retry_attempts);

        match request_fn() {
            Ok(response_text) => {
                debug!("Request succeeded on attempt {}", attempt);
                return Ok(response_text);
            }
            Err(error) => {
                let should_retry = match &error {
                    ureq::Error::StatusCode(status) => {
                        if *status >= 500 {
                            warn!(
                                "Server error (status {}), attempt {}/{}",
                                status, attempt, retry_attempts
                            );
                            true
                        } else {
                            warn!("Client error (status {}), not retrying", status);
                            return Err(RagError::Embedding(format!(
                                "Client error: HTTP {}",
                                status
                            )));
                        }
                    }
                    ureq::Error::ConnectionFailed
                    | ureq::Error::HostNotFound
                    | ureq::Error::Timeout(_)
                    | ureq::Error::Io(_) => {
                        warn!(
                            "Transport error: {}, attempt {}/{}",
                            error, attempt, retry_attempts
                        );
                        true
                    }
                    _ => {
                        warn!("Non-retryable error: {}", error);
                        false
                    }
                };

                if !should_retry {
                    return Err(RagError::Embedding(format!(
                        "Non-retryable error: {}",
                        error
                    )));
                }

                last_error = Some(RagError::Embedding(format!("Request error: {}", error)));

                if attempt < retry_attempts {
                    let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                    let delay = Duration::from_millis(delay_ms);
                    debug!("Waiting {:?} before retry", delay);
                    std::thread::sleep(delay);
                }
            }
        }
    }

    error!("All retry attempts failed");

    Err(last_error
        .unwrap_or_else(|| RagError::Embedding("Request failed after retries".to_string())))
}
