//! Configuration management for Verity.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - A YAML config file (`VERITY_CONFIG`, or `./verity.yaml` when present)
//! - Environment variables
//! - Caller overrides
//!
//! The engine never reads configuration globally: the resolved [`EngineSettings`]
//! value is handed to the controller when it is constructed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the LLM factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "openai"];

/// Default disclaimer prefixed to answers whose citations could not be verified.
pub const DEFAULT_SOFT_FAIL_BANNER: &str =
    "⚠️ Citations could not be fully verified. Please review the sources below.\n\n";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Active LLM provider ("ollama" or "openai")
    pub provider: String,

    /// Model identifier used for every completion call
    pub model: String,

    /// API key for the LLM provider
    pub api_key: Option<String>,

    /// Explicit completion endpoint, overriding the provider config
    pub llm_endpoint: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    /// Bounds and knobs for the correction loops
    pub engine: EngineSettings,

    /// Search backend endpoints
    pub search: SearchSettings,
}

/// LLM configuration from the YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    fn model(&self) -> &str {
        match self {
            ProviderConfig::OpenAI { model, .. } => model,
            ProviderConfig::Ollama { model, .. } => model,
        }
    }

    fn endpoint(&self) -> Option<&str> {
        match self {
            ProviderConfig::OpenAI { endpoint, .. } => endpoint.as_deref(),
            ProviderConfig::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }
}

/// Settings consumed read-only by the engine controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    /// Retrieval-loop bound (number of query rewrites allowed)
    pub max_iterations: u32,

    /// Generation-loop bound (number of regenerations allowed)
    pub max_generation_attempts: u32,

    /// Result limit for the internal structured backend
    pub default_match_count: usize,

    /// Result limit for the web backend
    pub web_result_count: usize,

    /// Exact string prefixed on answers whose citations were not verified
    pub citation_soft_fail_banner: String,

    /// Sampling temperature for answer generation
    pub generation_temperature: f32,

    /// Sampling temperature for query rewriting
    pub rewrite_temperature: f32,

    /// Word ceiling applied to rewritten queries
    pub max_rewrite_words: usize,

    /// Deadline for every individual search or completion call
    pub call_timeout_secs: u64,

    /// Directory holding prompt overrides (`<id>.yml`)
    pub prompts_dir: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_iterations: 2,
            max_generation_attempts: 1,
            default_match_count: 5,
            web_result_count: 3,
            citation_soft_fail_banner: DEFAULT_SOFT_FAIL_BANNER.to_string(),
            generation_temperature: 0.2,
            rewrite_temperature: 0.3,
            max_rewrite_words: 24,
            call_timeout_secs: 60,
            prompts_dir: None,
        }
    }
}

impl EngineSettings {
    /// Validate the engine bounds.
    pub fn validate(&self) -> AppResult<()> {
        if self.default_match_count == 0 && self.web_result_count == 0 {
            return Err(AppError::Config(
                "At least one of defaultMatchCount or webResultCount must be positive".to_string(),
            ));
        }

        if self.citation_soft_fail_banner.trim().is_empty() {
            return Err(AppError::Config(
                "citationSoftFailBanner cannot be blank".to_string(),
            ));
        }

        if self.call_timeout_secs == 0 {
            return Err(AppError::Config(
                "callTimeoutSecs must be greater than zero".to_string(),
            ));
        }

        if self.max_rewrite_words == 0 {
            return Err(AppError::Config(
                "maxRewriteWords must be greater than zero".to_string(),
            ));
        }

        for (name, value) in [
            ("generationTemperature", self.generation_temperature),
            ("rewriteTemperature", self.rewrite_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(AppError::Config(format!(
                    "{} must be within 0.0-2.0, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

/// Endpoints for the two search capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchSettings {
    /// Internal structured search (POST JSON `{query, match_count}`)
    pub internal_endpoint: String,

    /// SearxNG-compatible web search (GET `?q=..&format=json`)
    pub web_endpoint: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            internal_endpoint: "http://localhost:8000/search".to_string(),
            web_endpoint: "http://localhost:8888/search".to_string(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    logging: Option<LoggingConfig>,
    engine: Option<EngineSettings>,
    search: Option<SearchSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            api_key: None,
            llm_endpoint: None,
            log_level: None,
            no_color: false,
            llm: None,
            engine: EngineSettings::default(),
            search: SearchSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file, and environment variables.
    ///
    /// Environment variables:
    /// - `VERITY_CONFIG`: Path to config file (default `./verity.yaml`)
    /// - `VERITY_PROVIDER`: LLM provider
    /// - `VERITY_MODEL`: Model identifier
    /// - `VERITY_API_KEY`: API key
    /// - `VERITY_LLM_ENDPOINT`: Completion endpoint
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(config_file) = std::env::var("VERITY_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("verity.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("VERITY_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("VERITY_MODEL") {
            config.model = model;
        }

        if let Ok(endpoint) = std::env::var("VERITY_LLM_ENDPOINT") {
            config.llm_endpoint = Some(endpoint);
        }

        if let Ok(key) = std::env::var("VERITY_API_KEY") {
            config.api_key = Some(key);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Build a configuration from defaults plus a single YAML file.
    pub fn from_yaml_file(path: &Path) -> AppResult<Self> {
        let config = Self {
            config_file: Some(path.to_path_buf()),
            ..Self::default()
        };
        config.merge_yaml(path)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self;

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        if let Some(engine) = config_file.engine {
            result.engine = engine;
        }

        if let Some(search) = config_file.search {
            result.search = search;
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply caller overrides to the configuration.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the configuration for a provider, if the YAML file declared one.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Resolve the completion endpoint for the active provider.
    pub fn resolve_endpoint(&self) -> Option<String> {
        if let Some(ref endpoint) = self.llm_endpoint {
            return Some(endpoint.clone());
        }

        self.get_provider_config(&self.provider)
            .and_then(|pc| pc.endpoint())
            .map(str::to_string)
    }

    /// Resolve API key, preferring the explicit key over the provider's env var.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        match self.get_provider_config(&self.provider) {
            Some(ProviderConfig::OpenAI { api_key_env, .. }) => std::env::var(api_key_env).ok(),
            _ => None,
        }
    }

    /// Install the stderr tracing subscriber using the configured level and color.
    pub fn init_logging(&self) -> AppResult<()> {
        crate::logging::init_logging(self.log_level.as_deref(), self.no_color)
    }

    /// Validate configuration for the active provider and engine.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.to_lowercase().as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.model.trim().is_empty() {
            return Err(AppError::Config("Model cannot be empty".to_string()));
        }

        self.engine.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.engine.max_iterations, 2);
        assert_eq!(config.engine.max_generation_attempts, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            Some("openai".to_string()),
            Some("gpt-4o-mini".to_string()),
            Some("debug".to_string()),
            true,
        );

        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.log_level, Some("debug".to_string()));
        assert!(config.no_color);
    }

    #[test]
    fn test_validate_unknown_provider() {
        let config = AppConfig {
            provider: "unknown".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_banner() {
        let mut config = AppConfig::default();
        config.engine.citation_soft_fail_banner = "   ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut config = AppConfig::default();
        config.engine.generation_temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_disabled_backends() {
        let mut config = AppConfig::default();
        config.engine.default_match_count = 0;
        config.engine.web_result_count = 0;
        assert!(config.validate().is_err());

        config.engine.web_result_count = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_merge() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("verity.yaml");
        fs::write(
            &path,
            r#"
llm:
  activeProvider: openai
  providers:
    openai:
      apiKeyEnv: VERITY_TEST_UNSET_KEY
      model: gpt-4o-mini
      endpoint: https://llm.internal.example
logging:
  level: debug
  color: false
engine:
  maxIterations: 4
  citationSoftFailBanner: "[unverified] "
search:
  webEndpoint: https://searx.example/search
"#,
        )
        .unwrap();

        let config = AppConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.log_level, Some("debug".to_string()));
        assert!(config.no_color);
        assert_eq!(config.engine.max_iterations, 4);
        // Unspecified engine keys keep their defaults
        assert_eq!(config.engine.max_generation_attempts, 1);
        assert_eq!(config.engine.citation_soft_fail_banner, "[unverified] ");
        assert_eq!(config.search.web_endpoint, "https://searx.example/search");
        assert_eq!(
            config.search.internal_endpoint,
            SearchSettings::default().internal_endpoint
        );
        assert_eq!(
            config.resolve_endpoint(),
            Some("https://llm.internal.example".to_string())
        );
    }

    #[test]
    fn test_explicit_endpoint_wins() {
        let config = AppConfig {
            llm_endpoint: Some("http://override:11434".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(
            config.resolve_endpoint(),
            Some("http://override:11434".to_string())
        );
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("verity.yaml");
        fs::write(&path, "engine: [not, a, map").unwrap();

        let result = AppConfig::from_yaml_file(&path);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_explicit_api_key_preferred() {
        let config = AppConfig {
            api_key: Some("sk-test".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(config.resolve_api_key(), Some("sk-test".to_string()));
    }

    #[test]
    fn test_init_logging_uses_configured_level() {
        let config = AppConfig {
            log_level: Some("verity=notalevel".to_string()),
            no_color: true,
            ..AppConfig::default()
        };
        // The filter is parsed before any global subscriber is installed
        assert!(matches!(config.init_logging(), Err(AppError::Config(_))));
    }
}
