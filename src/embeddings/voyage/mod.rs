
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::VoyageConfig;
use crate::embeddings::{
    DEFAULT_RETRY_ATTEMPTS, DEFAULT_TIMEOUT_SECONDS, EmbeddingProvider, build_agent,
    request_with_retry, resolve_api_key,
};
use crate::{RagError, Result};

const API_KEY_ENV: &str = "VOYAGE_API_KEY";

/// Known model dimensions; unknown models fall back to 1024
const MODEL_DIMENSIONS: [(&str, usize); 7] = [
    ("voyage-3", 1024),
    ("voyage-3-lite", 512),
    ("voyage-code-3", 1024),
    ("voyage-finance-2", 1024),
    ("voyage-law-2", 1024),
    ("voyage-2", 1024),
    ("voyage-lite-02-instruct", 1024),
];

/// Embedding provider backed by the Voyage AI API
#[derive(Debug, Clone)]
pub struct VoyageEmbeddings {
    endpoint: Url,
    model: String,
    batch_size: u32,
    api_key: Option<String>,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Debug, Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

impl VoyageEmbeddings {
    /// Create a provider. A missing API key is not an error here; it is
    /// reported by the first embed call.
    #[inline]
    pub fn new(config: VoyageConfig, api_key: Option<String>) -> Result<Self> {
        let endpoint = Url::parse(&config.base_url)
            .and_then(|base| base.join("/v1/embeddings"))
            .map_err(|e| RagError::Config(format!("Invalid Voyage base URL: {}", e)))?;

        Ok(Self {
            endpoint,
            model: config.model,
            batch_size: config.batch_size,
            api_key,
            agent: build_agent(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    fn api_key(&self) -> Result<String> {
        resolve_api_key(self.api_key.as_deref(), API_KEY_ENV, "Voyage")
    }

    fn embed_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let api_key = self.api_key()?;

        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| RagError::Embedding(format!("Failed to serialize request: {}", e)))?;

        let response_text = request_with_retry(self.retry_attempts, || {
            self.agent
                .post(self.endpoint.as_str())
                .header("Content-Type", "application/json")
                .header("Authorization", &format!("Bearer {}", api_key))
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        let response: EmbedResponse = serde_json::from_str(&response_text)
            .map_err(|e| RagError::Embedding(format!("Failed to parse response: {}", e)))?;

        if response.data.len() != texts.len() {
            return Err(RagError::Embedding(format!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                response.data.len()
            )));
        }

        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

impl EmbeddingProvider for VoyageEmbeddings {
    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input = [text.to_string()];
        let mut vectors = self.embed_single_batch(&input)?;
        vectors
            .pop()
            .ok_or_else(|| RagError::Embedding("Empty embedding response".to_string()))
    }

    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating Voyage embeddings for {} texts", texts.len());

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size as usize) {
            vectors.extend(self.embed_single_batch(batch)?);
        }

        Ok(vectors)
    }

    #[inline]
    fn dimension(&self) -> usize {
        MODEL_DIMENSIONS
            .iter()
            .find(|(name, _)| *name == self.model)
            .map_or(1024, |(_, dim)| *dim)
    }

    #[inline]
    fn model_name(&self) -> &str {
        &self.model
    }
}
