//! Typed HTTP client for the extraction service
//!
//! For callers such as a chat bot that run in another process. Each client
//! is an explicit instance; there is no process-wide default.

use crate::api::extract::{BatchResponse, ExtractResponse};
use crate::extractors::{BatchItem, BatchOutcome};
use mqx_common::MusicMetadata;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client-side failures
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with `success: false` or a non-2xx status
    #[error("Service rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

/// Client for a running mqx-extract service
pub struct ExtractClient {
    client: Client,
    base_url: String,
}

impl ExtractClient {
    /// Client with the default 10 s timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// True when the service answers `/health` with a success status
    pub async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(url = %self.base_url, error = %e, "Extraction service health check failed");
                false
            }
        }
    }

    /// Extract one text
    pub async fn extract(
        &self,
        text: &str,
        user_id: Option<Value>,
    ) -> Result<MusicMetadata, ClientError> {
        let body = json!({"text": text, "user_id": user_id});
        let response: ExtractResponse = self.post("/extract", &body).await?;
        debug!(user_id = ?response.user_id, "Extraction received");
        decode_metadata(response.data)
    }

    /// Extract many texts; results come back in input order
    pub async fn extract_batch(
        &self,
        items: &[BatchItem],
    ) -> Result<Vec<BatchOutcome>, ClientError> {
        let body = json!({"texts": items});
        let response: BatchResponse = self.post("/extract/batch", &body).await?;

        response
            .results
            .into_iter()
            .map(|result| {
                Ok(BatchOutcome {
                    user_id: result.user_id,
                    data: decode_metadata(result.data)?,
                })
            })
            .collect()
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, ClientError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let payload: Value = response.json().await?;

        if !status.is_success() || payload.get("success") != Some(&Value::Bool(true)) {
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no message")
                .to_string();
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_value(payload).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

/// Compact `data` back into a typed descriptor
fn decode_metadata(data: Value) -> Result<MusicMetadata, ClientError> {
    serde_json::from_value(data).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}
