//! Configuration loading, validation, and management for Oraculo.
//!
//! Loads configuration from `~/.oraculo/config.toml` with environment
//! variable overrides. Read once at process start; the session engine never
//! touches the environment itself.

use oraculo_core::selection::{Credential, ProviderKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.oraculo/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key handed to the model client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default model provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Max tokens per response (provider default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_tokens: Option<u32>,

    /// Provider registry: provider name → allowed models
    #[serde(default = "default_providers")]
    pub providers: BTreeMap<String, ProviderConfig>,

    /// Content extraction settings
    #[serde(default)]
    pub loaders: LoaderConfig,

    /// Chat session settings
    #[serde(default)]
    pub session: SessionConfig,
}

fn default_provider() -> String {
    ProviderKind::OpenAi.as_str().into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_providers() -> BTreeMap<String, ProviderConfig> {
    let mut providers = BTreeMap::new();
    providers.insert(
        ProviderKind::OpenAi.as_str().into(),
        ProviderConfig {
            models: vec![
                "gpt-4o-mini".into(),
                "gpt-4o".into(),
                "o1-preview".into(),
                "o1-mini".into(),
            ],
            api_url: None,
        },
    );
    providers
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("providers", &self.providers)
            .field("loaders", &self.loaders)
            .field("session", &self.session)
            .finish()
    }
}

/// One provider entry in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Models a user may select for this provider
    #[serde(default)]
    pub models: Vec<String>,

    /// Override the API base URL (e.g., a proxy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Timeout for a single extraction (fetch, transcript, PDF parse)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// User-Agent sent when fetching web pages and transcripts
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Command used to turn a PDF into text
    #[serde(default = "default_pdf_command")]
    pub pdf_command: String,

    /// Preferred caption language for video transcripts
    #[serde(default = "default_transcript_language")]
    pub transcript_language: String,
}

fn default_request_timeout() -> u64 {
    30
}
fn default_user_agent() -> String {
    concat!("oraculo/", env!("CARGO_PKG_VERSION")).into()
}
fn default_pdf_command() -> String {
    "pdftotext".into()
}
fn default_transcript_language() -> String {
    "en".into()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
            pdf_command: default_pdf_command(),
            transcript_language: default_transcript_language(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name the assistant introduces itself with
    #[serde(default = "default_persona_name")]
    pub persona_name: String,

    /// Max seconds to wait for the next streamed chunk
    #[serde(default = "default_stream_timeout")]
    pub stream_timeout_secs: u64,

    /// Assistant turn recorded when a response fails mid-stream
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,

    /// Drop conversation history when a new source is loaded
    #[serde(default)]
    pub clear_history_on_reinit: bool,
}

fn default_persona_name() -> String {
    "Oracle".into()
}
fn default_stream_timeout() -> u64 {
    120
}
fn default_fallback_message() -> String {
    "Sorry, an error occurred while processing your request.".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            persona_name: default_persona_name(),
            stream_timeout_secs: default_stream_timeout(),
            fallback_message: default_fallback_message(),
            clear_history_on_reinit: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.oraculo/config.toml).
    ///
    /// Also checks environment variables:
    /// - `ORACULO_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `ORACULO_MODEL` overrides the default model
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("ORACULO_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .filter(|k| !k.trim().is_empty());
        }

        if let Ok(model) = std::env::var("ORACULO_MODEL") {
            config.default_model = model;
            config.validate()?;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".oraculo")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if let Some((name, _)) = self.providers.iter().find(|(_, p)| p.models.is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "provider '{name}' lists no models"
            )));
        }

        if !self.is_model_allowed(&self.default_provider, &self.default_model) {
            return Err(ConfigError::ValidationError(format!(
                "default_model '{}' is not offered by provider '{}'",
                self.default_model, self.default_provider
            )));
        }

        if self.session.stream_timeout_secs == 0 || self.loaders.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    /// Allowed models for a provider name, if the provider is registered.
    pub fn models_for(&self, provider: &str) -> Option<&[String]> {
        self.providers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(provider))
            .map(|(_, p)| p.models.as_slice())
    }

    /// Whether `model` is on the allow-list of `provider`.
    pub fn is_model_allowed(&self, provider: &str, model: &str) -> bool {
        self.models_for(provider)
            .is_some_and(|models| models.iter().any(|m| m == model))
    }

    /// API base URL override for a provider.
    pub fn api_url_for(&self, provider: &str) -> Option<&str> {
        self.providers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(provider))
            .and_then(|(_, p)| p.api_url.as_deref())
    }

    /// The configured credential, if any.
    pub fn credential(&self) -> Option<Credential> {
        self.api_key.as_deref().map(Credential::new)
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: None,
            providers: default_providers(),
            loaders: LoaderConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
