//! HTTP API handlers for mqx-extract

pub mod extract;
pub mod health;

pub use extract::extract_routes;
pub use health::health_routes;

use crate::error::ApiError;

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Endpoint not found".to_string())
}
