//! LLM integration crate for Verity.
//!
//! This crate provides a provider-agnostic abstraction over text completion
//! endpoints. The engine only ever needs one capability from a model:
//! `complete(system, prompt, temperature) -> text`.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **OpenAI-compatible**: any `/v1/chat/completions` endpoint
//! - **Mock**: scripted replies for tests
//!
//! # Example
//! ```no_run
//! use verity_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2").with_temperature(0.0);
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{MockLlmClient, OllamaClient, OpenAiClient, RecordedCall};
pub use types::ProviderType;
