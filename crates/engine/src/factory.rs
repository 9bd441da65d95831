//! Controller composition from application configuration.

use crate::controller::{Controller, EngineDeps};
use crate::sources::{InternalSearch, WebSearch};
use std::sync::Arc;
use std::time::Duration;
use verity_core::{AppConfig, AppError, AppResult};
use verity_llm::create_client;
use verity_prompt::PromptLibrary;

/// Build a controller wired to the configured provider and search endpoints.
///
/// # Errors
/// Returns `AppError::Config` for invalid settings or an unusable provider,
/// and `AppError::Prompt` when a prompt override fails to load.
pub fn build_controller(config: &AppConfig) -> AppResult<Controller> {
    config.validate()?;

    let endpoint = config.resolve_endpoint();
    let api_key = config.resolve_api_key();
    let llm = create_client(&config.provider, endpoint.as_deref(), api_key.as_deref())?;

    let prompts = PromptLibrary::load(config.engine.prompts_dir.as_deref())?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.engine.call_timeout_secs))
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

    tracing::info!(
        "Engine using {} model '{}', internal search at {}, web search at {}",
        llm.provider_name(),
        config.model,
        config.search.internal_endpoint,
        config.search.web_endpoint
    );

    Controller::new(
        config.engine.clone(),
        EngineDeps {
            llm,
            model: config.model.clone(),
            prompts,
            internal: Arc::new(InternalSearch::new(
                http.clone(),
                config.search.internal_endpoint.clone(),
            )),
            web: Arc::new(WebSearch::new(http, config.search.web_endpoint.clone())),
        },
    )
}
