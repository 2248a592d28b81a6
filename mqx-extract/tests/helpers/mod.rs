//! Shared test helpers: scripted backend and app construction

#![allow(dead_code)]

use async_trait::async_trait;
use mqx_common::config::{ExtractorConfig, Strategy};
use mqx_common::{ArtistOrigin, NormalizationSettings, Normalizer};
use mqx_extract::backends::{BackendError, CompletionOptions, CompletionRequest, LlmBackend};
use mqx_extract::extractors::{build_extractor, Extractor};
use mqx_extract::AppState;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Backend replaying scripted completions in order
///
/// Once the script runs out every call fails with a connection error.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, BackendError>>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<Result<String, BackendError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn ok(replies: &[&str]) -> Arc<Self> {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "test-model"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Connection("script exhausted".into())))
    }

    async fn health_check(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Normalizer pinned to 2024 so year clamping is deterministic
pub fn normalizer() -> Normalizer {
    Normalizer::new(
        NormalizationSettings {
            reference_year: Some(2024),
            ..NormalizationSettings::default()
        },
        ArtistOrigin::Language,
    )
}

pub fn extractor(backend: Arc<ScriptedBackend>, strategy: Strategy) -> Arc<dyn Extractor> {
    let config = ExtractorConfig {
        strategy,
        ..ExtractorConfig::default()
    };
    build_extractor(&config, normalizer(), backend, CompletionOptions::default())
}

pub fn app_state(backend: Arc<ScriptedBackend>) -> AppState {
    let extractor = extractor(backend.clone(), Strategy::Prompt);
    AppState::new(extractor, backend)
}
