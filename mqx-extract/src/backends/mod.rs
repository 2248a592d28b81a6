//! LLM backend collaborators
//!
//! The extractors treat the model as an opaque text generator behind the
//! [`LlmBackend`] trait. Output is untrusted; parsing and normalization
//! happen in [`crate::extractors`].

mod llamacpp;
mod ollama;
mod provider;

pub use llamacpp::LlamaCppBackend;
pub use ollama::OllamaBackend;
pub use provider::{
    BackendError, CompletionOptions, CompletionRequest, LlmBackend, Message, MessageRole,
};

use mqx_common::config::{BackendConfig, BackendKind};
use std::sync::Arc;
use std::time::Duration;

/// Build the configured backend
pub fn build_backend(config: &BackendConfig) -> Result<Arc<dyn LlmBackend>, BackendError> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let backend: Arc<dyn LlmBackend> = match config.kind {
        BackendKind::Ollama => Arc::new(OllamaBackend::new(
            config.base_url.clone(),
            config.model.clone(),
            timeout,
        )?),
        BackendKind::LlamaCpp => Arc::new(LlamaCppBackend::new(config.base_url.clone(), timeout)?),
    };
    Ok(backend)
}

/// Completion options derived from backend configuration
pub fn completion_options(config: &BackendConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        timeout: Duration::from_secs(config.timeout_secs),
    }
}

fn map_reqwest_error(error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Connection(error.to_string())
    }
}
