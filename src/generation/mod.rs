// Generation module
// Completion client used for answer generation and LLM graph extraction


use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::GenerationConfig;
use crate::embeddings::{DEFAULT_TIMEOUT_SECONDS, build_agent, resolve_api_key};
use crate::{RagError, Result};

const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// A component producing a completion for a system/user prompt pair.
///
/// Failures propagate to the caller unmodified; no retry or backoff is
/// applied at this layer.
pub trait GenerationProvider: Send + Sync {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String>;

    fn model_name(&self) -> &str;
}

/// Completion client for an OpenAI-compatible chat completions API
#[derive(Debug, Clone)]
pub struct OpenAiGeneration {
    endpoint: Url,
    model: String,
    api_key: Option<String>,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenAiGeneration {
    /// Create a client. A missing API key is not an error here; it is
    /// reported by the first completion call.
    #[inline]
    pub fn new(config: GenerationConfig, api_key: Option<String>) -> Result<Self> {
        let endpoint = Url::parse(&config.base_url)
            .and_then(|base| base.join("/v1/chat/completions"))
            .map_err(|e| RagError::Config(format!("Invalid generation base URL: {}", e)))?;

        Ok(Self {
            endpoint,
            model: config.model,
            api_key,
            agent: build_agent(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)),
        })
    }

    fn api_key(&self) -> Result<String> {
        resolve_api_key(self.api_key.as_deref(), API_KEY_ENV, "OpenAI")
            .map_err(|e| RagError::Generation(e.to_string()))
    }
}

impl GenerationProvider for OpenAiGeneration {
    #[inline]
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let api_key = self.api_key()?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature,
            max_tokens,
        };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| RagError::Generation(format!("Failed to serialize request: {}", e)))?;

        debug!(
            "Requesting completion from {} (max_tokens: {})",
            self.model, max_tokens
        );

        let response_text = self
            .agent
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {}", api_key))
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| RagError::Generation(format!("Completion request failed: {}", e)))?;

        let response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| RagError::Generation(format!("Failed to parse response: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RagError::Generation("Completion response had no content".to_string()))
    }

    #[inline]
    fn model_name(&self) -> &str {
        &self.model
    }
}
