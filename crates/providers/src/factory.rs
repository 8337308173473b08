//! Client factory: builds model clients from a provider selection.

use std::sync::Arc;

use oraculo_config::AppConfig;
use oraculo_core::error::ProviderError;
use oraculo_core::provider::{ClientFactory, Provider};
use oraculo_core::selection::{Credential, ProviderKind};
use tracing::debug;

use crate::openai_compat::OpenAiCompatProvider;

/// Builds OpenAI-compatible clients, honoring per-provider URL overrides.
#[derive(Debug, Clone, Default)]
pub struct OpenAiClientFactory {
    base_url_override: Option<String>,
}

impl OpenAiClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point every client at a different base URL (proxy, local server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url_override = Some(url.into());
        self
    }

    /// Build a factory from configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            base_url_override: config
                .api_url_for(ProviderKind::OpenAi.as_str())
                .map(String::from),
        }
    }
}

impl ClientFactory for OpenAiClientFactory {
    fn create(
        &self,
        provider: ProviderKind,
        model: &str,
        credential: &Credential,
    ) -> Result<Arc<dyn Provider>, ProviderError> {
        let base_url = self
            .base_url_override
            .clone()
            .unwrap_or_else(|| default_base_url(provider).into());

        debug!(provider = %provider, model = %model, base_url = %base_url, "Building model client");

        let client = match provider {
            ProviderKind::OpenAi => {
                OpenAiCompatProvider::try_new("openai", base_url, credential.expose())?
            }
        };
        Ok(Arc::new(client))
    }
}

/// Get the default base URL for a provider.
fn default_base_url(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::OpenAi => "https://api.openai.com/v1",
    }
}
