//! Verity Core Library
//!
//! This crate provides the foundational utilities shared by the Verity crates:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (LLM, search backends, engine bounds)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, EngineSettings, SearchSettings};
pub use error::{AppError, AppResult};
