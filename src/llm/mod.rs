//! Language-model text-completion collaborator
//!
//! The pipeline consumes generation as a black box behind
//! [`CompletionService`]; the default implementation talks to an
//! OpenAI-compatible chat-completions endpoint. Failures are recoverable:
//! callers fall back to the solution normalizer's deterministic paths.

pub mod prompts;

pub use prompts::PromptTemplate;
pub use prompts::TutorPrompts;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::config::LlmConfig;
use crate::errors::MathRagError;
use crate::errors::Result;

/// Black-box text completion: prompt in, text out.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Complete a prompt. Must tolerate arbitrary latency; errors are
    /// recoverable and trigger the caller's fallback path.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
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
    content: String,
}

/// Completion client for OpenAI-compatible chat endpoints
pub struct LlmService {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl LlmService {
    /// Create a new completion client from configuration.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| MathRagError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.llm_endpoint.clone(),
            api_key: config.llm_key.clone(),
            model: config.llm_model.clone(),
        })
    }
}

#[async_trait]
impl CompletionService for LlmService {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!("Requesting completion ({} chars prompt)", prompt.len());

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.3,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| MathRagError::Generation(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MathRagError::Generation(format!(
                "completion endpoint returned {}",
                response.status()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| MathRagError::Generation(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| MathRagError::Generation("empty completion response".to_string()))
    }
}
