//! Extractor strategies
//!
//! Two interchangeable implementations of [`Extractor`], chosen by
//! configuration:
//! - [`PromptExtractor`] - instruction prompt plus worked examples, free-form
//!   completion, lenient parsing
//! - [`ConstrainedExtractor`] - JSON-schema constrained decoding, strict
//!   parsing
//!
//! # Failure isolation
//! `extract` never fails. Backend, parse and shape errors are logged at
//! `error` and turned into an empty descriptor, so a caller always gets a
//! valid [`MusicMetadata`], possibly with nothing in it.

pub mod constrained;
pub mod prompt;
pub mod schema;

pub use constrained::ConstrainedExtractor;
pub use prompt::PromptExtractor;

use crate::backends::{BackendError, CompletionOptions, CompletionRequest, LlmBackend};
use async_trait::async_trait;
use mqx_common::config::{ExtractorConfig, Strategy};
use mqx_common::{MusicMetadata, Normalizer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error};

/// Reasons a single extraction produced nothing
///
/// Never leaves this module's public `extract` path; it exists so the
/// internal pipeline can use `?` and log one precise cause.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Backend call failed (network, HTTP status, timeout)
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Completion text is not JSON
    #[error("Unparseable completion: {0}")]
    Parse(String),

    /// Completion is JSON but not a descriptor-shaped object
    #[error("Unexpected completion shape: {0}")]
    Shape(#[from] mqx_common::Error),
}

/// One batch request entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    #[serde(default)]
    pub text: String,
    /// Opaque caller identifier, echoed back unchanged
    #[serde(default)]
    pub user_id: Option<Value>,
}

impl BatchItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            user_id: None,
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<Value>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// One batch result entry, positionally matching its [`BatchItem`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub data: MusicMetadata,
}

/// Turns free text into a canonical music-search descriptor
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Strategy name ("prompt" or "constrained")
    fn name(&self) -> &str;

    /// Whether results are compact-projected
    fn is_compact(&self) -> bool;

    /// Extract a descriptor; empty on any failure
    ///
    /// Empty or whitespace-only text returns immediately without calling
    /// the backend.
    async fn extract(&self, text: &str) -> MusicMetadata;

    /// Extract and convert to JSON, compact-projected in compact mode
    async fn extract_to_dict(&self, text: &str) -> Value {
        self.extract(text).await.to_value(self.is_compact())
    }

    /// Extract every item in order, one at a time
    ///
    /// A failed item yields an empty descriptor in its slot; later items
    /// still run.
    async fn extract_batch(&self, items: &[BatchItem]) -> Vec<BatchOutcome> {
        let mut outcomes = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            debug!(extractor = self.name(), index, "Extracting batch item");
            outcomes.push(BatchOutcome {
                user_id: item.user_id.clone(),
                data: self.extract(&item.text).await,
            });
        }

        debug!(
            extractor = self.name(),
            items = outcomes.len(),
            "Batch extraction complete"
        );
        outcomes
    }
}

/// Backend call + parse + normalize, shared by both strategies
pub(crate) struct Pipeline {
    backend: Arc<dyn LlmBackend>,
    normalizer: Normalizer,
    options: CompletionOptions,
    compact: bool,
}

impl Pipeline {
    pub(crate) fn new(
        backend: Arc<dyn LlmBackend>,
        normalizer: Normalizer,
        options: CompletionOptions,
        compact: bool,
    ) -> Self {
        Self {
            backend,
            normalizer,
            options,
            compact,
        }
    }

    pub(crate) fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub(crate) fn options(&self) -> &CompletionOptions {
        &self.options
    }

    pub(crate) fn compact(&self) -> bool {
        self.compact
    }

    /// Run one request and absorb every failure into an empty descriptor
    pub(crate) async fn run(
        &self,
        extractor: &str,
        request: CompletionRequest,
        parse: fn(&str) -> Result<Value, ExtractError>,
    ) -> MusicMetadata {
        let start = Instant::now();

        match self.try_run(&request, parse).await {
            Ok(metadata) => {
                let metadata = if self.compact {
                    metadata.compacted()
                } else {
                    metadata
                };
                debug!(
                    extractor,
                    backend = self.backend.name(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    empty = metadata.is_empty(),
                    "Extraction complete"
                );
                metadata
            }
            Err(e) => {
                error!(
                    extractor,
                    backend = self.backend.name(),
                    error = %e,
                    "Extraction failed, returning empty metadata"
                );
                MusicMetadata::empty()
            }
        }
    }

    async fn try_run(
        &self,
        request: &CompletionRequest,
        parse: fn(&str) -> Result<Value, ExtractError>,
    ) -> Result<MusicMetadata, ExtractError> {
        let completion = self.backend.complete(request).await?;
        let raw = parse(&completion)?;
        Ok(self.normalizer.canonicalize(&raw)?)
    }
}

/// Build the configured extractor strategy
pub fn build_extractor(
    config: &ExtractorConfig,
    normalizer: Normalizer,
    backend: Arc<dyn LlmBackend>,
    options: CompletionOptions,
) -> Arc<dyn Extractor> {
    match config.strategy {
        Strategy::Prompt => Arc::new(PromptExtractor::new(
            backend,
            normalizer,
            options,
            config.compact,
        )),
        Strategy::Constrained => Arc::new(ConstrainedExtractor::new(
            backend,
            normalizer,
            options,
            config.compact,
        )),
    }
}

/// Test doubles for extractor tests
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Backend replaying scripted completions, counting calls
    pub struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<String, BackendError>>>,
        calls: AtomicUsize,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedBackend {
        pub fn new(replies: Vec<Result<String, BackendError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn replying(reply: &str) -> Self {
            Self::new(vec![Ok(reply.to_string())])
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_request(&self) -> Option<CompletionRequest> {
            self.requests.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(BackendError::Connection("no scripted reply".into())))
        }

        async fn health_check(&self) -> Result<(), BackendError> {
            Ok(())
        }
    }
}
