//! Prompt system for Verity.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions (system message + user template)
//! - Built-in definitions for every engine role
//! - Per-deployment overrides loaded from a prompts directory
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{list_prompts, load_prompt, PromptLibrary};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptOutputSpec};

/// Prompt identifiers used by the engine.
pub mod ids {
    pub const GRADE: &str = "engine.grade";
    pub const VERIFY: &str = "engine.verify";
    pub const REWRITE: &str = "engine.rewrite";
    pub const GENERATE: &str = "engine.generate";
}
