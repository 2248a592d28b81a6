//! mqx-extract library interface
//!
//! Turns free-text music requests into canonical descriptors through an
//! LLM backend, and serves that over HTTP. Exposed as a library for
//! integration testing and for callers embedding [`client::ExtractClient`].

pub mod api;
pub mod backends;
pub mod client;
pub mod error;
pub mod extractors;
pub mod logging;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use backends::LlmBackend;
use chrono::{DateTime, Utc};
use extractors::Extractor;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Configured extraction strategy
    pub extractor: Arc<dyn Extractor>,
    /// Backend behind the extractor, reported by /health
    pub backend: Arc<dyn LlmBackend>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(extractor: Arc<dyn Extractor>, backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            extractor,
            backend,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::extract_routes())
        .fallback(api::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
