//! Client for asking a language model who wrote a paper.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::InferenceError;
use crate::models::{OllamaConfig, ParsedReply};
use crate::services::reply::parse_reply;
use crate::utils::retry::{RetryPolicy, with_retry};

/// Instruction sent ahead of the first-page text.
pub const PROMPT_TEMPLATE: &str = "Can you tell me the title and authors of this academic \
paper from the start of its first page? Answer with the title on a line starting with \
\"Title:\" and the authors, separated by commas, on a line starting with \"Authors:\".\n\n";

/// Build the full prompt for one paper.
pub fn build_prompt(first_page: &str) -> String {
    format!("{PROMPT_TEMPLATE}{first_page}")
}

/// Something that can infer a paper's title and authors from its first page.
#[async_trait]
pub trait MetadataInference: Send + Sync {
    async fn infer(&self, first_page: &str) -> Result<ParsedReply, InferenceError>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Request body for the /api/chat endpoint.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: String,
}

/// Response from the /api/tags endpoint.
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// What the model server reported on a health check.
#[derive(Debug, Clone)]
pub struct ServerHealth {
    pub models: Vec<String>,
    pub model_available: bool,
}

/// JSON schema the reply is constrained to when structured output is on.
fn paper_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string" },
            "authors": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["title", "authors"]
    })
}

/// Client for an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    timeout_secs: u64,
    structured_output: bool,
    retry: RetryPolicy,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InferenceError::ServiceUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
            structured_output: config.structured_output,
            retry: RetryPolicy::with_retries(config.max_retries),
        })
    }

    pub fn with_defaults() -> Result<Self, InferenceError> {
        Self::new(&OllamaConfig::default())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List pulled models and check that the configured one is among them.
    pub async fn health_check(&self) -> Result<ServerHealth, InferenceError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(InferenceError::ServerError {
                status: response.status().as_u16(),
                message: "health check failed".to_string(),
            });
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;
        let models: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
        let model_available = models.iter().any(|name| model_matches(name, &self.model));

        Ok(ServerHealth {
            models,
            model_available,
        })
    }

    /// Send one chat request and return the raw reply text.
    pub async fn complete(&self, prompt: &str) -> Result<String, InferenceError> {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
            format: self.structured_output.then(paper_schema),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::ServerError {
                status: status.as_u16(),
                message: body,
            });
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                InferenceError::Timeout(self.timeout_secs)
            } else {
                InferenceError::InvalidResponse(e.to_string())
            }
        })?;

        Ok(chat.message.content)
    }

    fn transport_error(&self, e: reqwest::Error) -> InferenceError {
        if e.is_timeout() {
            InferenceError::Timeout(self.timeout_secs)
        } else {
            InferenceError::ServiceUnavailable(e.to_string())
        }
    }
}

#[async_trait]
impl MetadataInference for OllamaClient {
    async fn infer(&self, first_page: &str) -> Result<ParsedReply, InferenceError> {
        let prompt = build_prompt(first_page);
        let reply = with_retry(&self.retry, || self.complete(&prompt)).await?;
        debug!(model = %self.model, reply = %reply, "model replied");
        Ok(parse_reply(&reply))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Ollama reports `qwen2.5` as `qwen2.5:latest`.
fn model_matches(pulled: &str, wanted: &str) -> bool {
    pulled == wanted || (!wanted.contains(':') && pulled == format!("{wanted}:latest"))
}
