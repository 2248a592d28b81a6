//! llama.cpp server backend implementation.

use super::map_reqwest_error;
use super::provider::{BackendError, CompletionRequest, LlmBackend, Message, MessageRole};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Token limit when none is configured
const DEFAULT_N_PREDICT: i32 = 256;

/// llama.cpp server backend.
///
/// Uses the raw `/completion` endpoint, which accepts a `json_schema` and
/// compiles it to a grammar, so decoding can only produce schema-shaped
/// JSON. The server hosts a single model, so there is no model selection.
pub struct LlamaCppBackend {
    client: Client,
    base_url: String,
}

impl LlamaCppBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn completion_request(&self, request: &CompletionRequest) -> LlamaCompletionRequest {
        LlamaCompletionRequest {
            prompt: flatten_messages(&request.messages),
            json_schema: request.schema.clone(),
            n_predict: request
                .options
                .max_tokens
                .map(|n| n as i32)
                .unwrap_or(DEFAULT_N_PREDICT),
            temperature: request.options.temperature,
            stream: false,
        }
    }
}

/// Render chat turns as a plain-text transcript ending with the
/// assistant's cue
fn flatten_messages(messages: &[Message]) -> String {
    let mut prompt = String::new();
    for message in messages {
        let speaker = match message.role {
            MessageRole::System => "System",
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
        };
        prompt.push_str(speaker);
        prompt.push_str(": ");
        prompt.push_str(message.content.trim());
        prompt.push('\n');
    }
    prompt.push_str("Assistant: ");
    prompt
}

#[async_trait]
impl LlmBackend for LlamaCppBackend {
    fn name(&self) -> &str {
        "llamacpp"
    }

    fn model(&self) -> &str {
        "default"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        let url = format!("{}/completion", self.base_url);
        let body = self.completion_request(request);

        debug!(
            prompt_chars = body.prompt.len(),
            constrained = body.json_schema.is_some(),
            "Sending completion request to llama.cpp"
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .timeout(request.options.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: LlamaCompletionResponse = response.json().await.map_err(|e| {
            BackendError::InvalidResponse(format!("Failed to parse llama.cpp response: {}", e))
        })?;

        debug!(
            chars = completion.content.len(),
            stopped_limit = completion.stopped_limit,
            "Received completion response from llama.cpp"
        );

        Ok(completion.content)
    }

    async fn health_check(&self) -> Result<(), BackendError> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(BackendError::Api {
                status: response.status().as_u16(),
                message: "Health check failed".to_string(),
            })
        }
    }
}

// llama.cpp API types

#[derive(Debug, Serialize)]
struct LlamaCompletionRequest {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    json_schema: Option<Value>,
    n_predict: i32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct LlamaCompletionResponse {
    content: String,
    #[serde(default)]
    stopped_limit: bool,
}
