//! Error types for Verity.
//!
//! This module defines a unified error enum covering every failure the engine
//! can surface. Quality-gate outcomes (irrelevant context, unsupported citations)
//! are deliberately absent: they are state transitions, not errors.

use thiserror::Error;

/// Unified error type for the Verity crates.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Completion endpoint errors (transport or non-success status)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Search backend errors (transport or non-success status)
    #[error("Search error: {0}")]
    Search(String),

    /// Prompt loading and rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// A remote call did not complete before its deadline
    #[error("Timed out after {secs}s: {operation}")]
    Timeout { operation: String, secs: u64 },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
