//! Extraction endpoints
//!
//! `data` is always the compact projection: `{}` when nothing was
//! extracted, which is a successful response, not an error.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::extractors::BatchItem;
use crate::AppState;

/// POST /extract request body
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: Option<String>,
    #[serde(default)]
    pub user_id: Option<Value>,
}

/// POST /extract response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub success: bool,
    pub data: Value,
    pub user_id: Option<Value>,
}

/// POST /extract/batch request body
///
/// `texts` stays untyped so a non-array value can be reported precisely.
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub texts: Option<Value>,
}

/// One entry of a batch response
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResult {
    pub user_id: Option<Value>,
    pub data: Value,
}

/// POST /extract/batch response body
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    pub results: Vec<BatchResult>,
}

/// POST /extract
pub async fn extract(
    State(state): State<AppState>,
    payload: Result<Json<ExtractRequest>, JsonRejection>,
) -> ApiResult<Json<ExtractResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let text = request
        .text
        .ok_or_else(|| ApiError::BadRequest("Missing 'text' field in request".to_string()))?;
    let text = text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("Empty text provided".to_string()));
    }

    debug!(chars = text.len(), user_id = ?request.user_id, "Extract request");
    let metadata = state.extractor.extract(text).await;

    Ok(Json(ExtractResponse {
        success: true,
        data: metadata.to_compact_value(),
        user_id: request.user_id,
    }))
}

/// POST /extract/batch
pub async fn extract_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> ApiResult<Json<BatchResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let texts = request
        .texts
        .ok_or_else(|| ApiError::BadRequest("Missing 'texts' field in request".to_string()))?;
    let Value::Array(entries) = texts else {
        return Err(ApiError::BadRequest("'texts' must be an array".to_string()));
    };

    let items: Vec<BatchItem> = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let user_id = entry.get("user_id").filter(|id| !id.is_null()).cloned();
            serde_json::from_value(entry).unwrap_or_else(|e| {
                warn!(index, error = %e, "Malformed batch entry, treating as empty text");
                BatchItem {
                    text: String::new(),
                    user_id,
                }
            })
        })
        .collect();

    info!(items = items.len(), "Batch extract request");
    let outcomes = state.extractor.extract_batch(&items).await;

    let results = outcomes
        .into_iter()
        .map(|outcome| BatchResult {
            user_id: outcome.user_id,
            data: outcome.data.to_compact_value(),
        })
        .collect();

    Ok(Json(BatchResponse {
        success: true,
        results,
    }))
}

/// Build extraction routes
pub fn extract_routes() -> Router<AppState> {
    Router::new()
        .route("/extract", post(extract))
        .route("/extract/batch", post(extract_batch))
}
