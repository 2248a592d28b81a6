//! Common error types for MQX

use thiserror::Error;

/// Common result type for MQX operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across MQX crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Raw backend output that cannot be turned into a descriptor
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
