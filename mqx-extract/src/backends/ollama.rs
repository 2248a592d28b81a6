//! Ollama backend implementation.

use super::map_reqwest_error;
use super::provider::{BackendError, CompletionRequest, LlmBackend, Message};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Ollama backend.
///
/// Uses the non-streaming `/api/chat` endpoint. When the request carries a
/// JSON schema it is passed as `format`, which makes Ollama constrain
/// decoding to that schema.
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the Ollama server (e.g., "http://localhost:11434").
    /// * `model` - Model to use (e.g., "llama3.1:8b").
    /// * `timeout` - Default request timeout.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    fn chat_request(&self, request: &CompletionRequest) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.model.clone(),
            messages: request.messages.iter().map(OllamaMessage::from).collect(),
            stream: false,
            format: request.schema.clone(),
            options: OllamaOptions {
                temperature: Some(request.options.temperature),
                num_predict: request.options.max_tokens.map(|n| n as i32),
            },
        }
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = self.chat_request(request);

        debug!(
            model = %self.model,
            message_count = request.messages.len(),
            constrained = request.schema.is_some(),
            "Sending completion request to Ollama"
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

        let chat: OllamaChatResponse = response.json().await.map_err(|e| {
            BackendError::InvalidResponse(format!("Failed to parse Ollama response: {}", e))
        })?;

        if chat.done_reason.as_deref() == Some("length") {
            warn!(model = %self.model, "Ollama completion hit the token limit");
        }

        debug!(
            chars = chat.message.content.len(),
            "Received completion response from Ollama"
        );

        Ok(chat.message.content)
    }

    async fn health_check(&self) -> Result<(), BackendError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(BackendError::Api {
                status: response.status().as_u16(),
                message: "Health check failed".to_string(),
            });
        }

        let tags: OllamaTagsResponse = response.json().await.map_err(|e| {
            BackendError::InvalidResponse(format!("Failed to parse tags response: {}", e))
        })?;

        if !tags.models.iter().any(|m| m.name == self.model) {
            warn!(
                model = %self.model,
                available_models = ?tags.models.iter().map(|m| &m.name).collect::<Vec<_>>(),
                "Configured model not found in Ollama"
            );
        }

        Ok(())
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<Value>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

impl From<&Message> for OllamaMessage {
    fn from(msg: &Message) -> Self {
        OllamaMessage {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    #[serde(default)]
    done_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::CompletionOptions;
    use serde_json::json;

    fn backend() -> OllamaBackend {
        OllamaBackend::new("http://localhost:11434/", "llama3.1:8b", Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        assert_eq!(backend().base_url, "http://localhost:11434");
    }

    #[test]
    fn test_message_conversion() {
        let ollama: OllamaMessage = (&Message::user("Hello")).into();
        assert_eq!(ollama.role, "user");
        assert_eq!(ollama.content, "Hello");

        let ollama: OllamaMessage = (&Message::system("Extract music info")).into();
        assert_eq!(ollama.role, "system");
    }

    #[test]
    fn test_free_form_request_has_no_format() {
        let request = CompletionRequest {
            messages: vec![Message::user("jazz please")],
            schema: None,
            options: CompletionOptions::default(),
        };

        let body = serde_json::to_value(backend().chat_request(&request)).unwrap();
        assert_eq!(body["model"], "llama3.1:8b");
        assert_eq!(body["stream"], false);
        assert!(body.get("format").is_none());
        assert!(body["options"].get("num_predict").is_none());
    }

    #[test]
    fn test_schema_is_sent_as_format() {
        let schema = json!({"type": "object"});
        let request = CompletionRequest {
            messages: vec![Message::user("jazz please")],
            schema: Some(schema.clone()),
            options: CompletionOptions {
                max_tokens: Some(128),
                ..CompletionOptions::default()
            },
        };

        let body = serde_json::to_value(backend().chat_request(&request)).unwrap();
        assert_eq!(body["format"], schema);
        assert_eq!(body["options"]["num_predict"], 128);
    }

    #[test]
    fn test_response_parsing() {
        let response: OllamaChatResponse = serde_json::from_value(json!({
            "model": "llama3.1:8b",
            "message": {"role": "assistant", "content": "{\"limit\": 5}"},
            "done": true,
            "done_reason": "stop"
        }))
        .unwrap();
        assert_eq!(response.message.content, "{\"limit\": 5}");
        assert_eq!(response.done_reason.as_deref(), Some("stop"));
    }
}
