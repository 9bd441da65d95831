//! LLM provider factory.
//!
//! Creates LLM clients from the resolved provider name, endpoint and key.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use std::sync::Arc;
use verity_core::{AppError, AppResult};

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "openai")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (required for "openai")
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// API key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    let base_url = endpoint.unwrap_or(provider_type.default_endpoint());
    tracing::debug!("Creating {} client for {}", provider_type.as_str(), base_url);

    match provider_type {
        ProviderType::Ollama => Ok(Arc::new(OllamaClient::with_base_url(base_url))),
        ProviderType::OpenAI => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI provider requires API key".to_string())
            })?;
            Ok(Arc::new(OpenAiClient::new(base_url, api_key)))
        }
    }
}
