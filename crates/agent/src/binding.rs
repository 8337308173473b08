//! Model binding: a prompt template bound to a model client.

use std::collections::HashMap;
use std::sync::Arc;

use oraculo_config::AppConfig;
use oraculo_core::error::{BindingError, ProviderError};
use oraculo_core::message::Turn;
use oraculo_core::provider::{ChunkReceiver, ClientFactory, Provider, ProviderRequest};
use oraculo_core::selection::{ModelSelection, ProviderKind};
use tracing::{debug, info, warn};

use crate::prompt::PromptTemplate;

/// Validates model selections and produces [`ChatBinding`]s.
pub struct BindingFactory {
    /// Allowed model names per provider
    allowed: HashMap<ProviderKind, Vec<String>>,

    clients: Arc<dyn ClientFactory>,

    temperature: f32,

    max_tokens: Option<u32>,
}

impl BindingFactory {
    /// A factory with an empty registry. Register models with
    /// [`allow_models`](Self::allow_models).
    pub fn new(clients: Arc<dyn ClientFactory>) -> Self {
        Self {
            allowed: HashMap::new(),
            clients,
            temperature: 0.7,
            max_tokens: None,
        }
    }

    /// Build the registry and sampling defaults from configuration.
    ///
    /// Registry entries naming an unsupported provider are skipped.
    pub fn from_config(config: &AppConfig, clients: Arc<dyn ClientFactory>) -> Self {
        let mut factory = Self::new(clients).with_temperature(config.default_temperature);
        factory.max_tokens = config.default_max_tokens;

        for (name, provider) in &config.providers {
            match name.parse::<ProviderKind>() {
                Ok(kind) => factory = factory.allow_models(kind, provider.models.iter().cloned()),
                Err(_) => warn!(provider = %name, "Skipping unsupported provider in registry"),
            }
        }
        factory
    }

    pub fn allow_models<I, S>(mut self, provider: ProviderKind, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed
            .entry(provider)
            .or_default()
            .extend(models.into_iter().map(Into::into));
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Allowed models for a provider (empty if unregistered).
    pub fn models_for(&self, provider: ProviderKind) -> &[String] {
        self.allowed.get(&provider).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check a selection without building anything.
    ///
    /// Checks run in order: provider registered, credential present, model
    /// allowed.
    pub fn validate(&self, selection: &ModelSelection) -> Result<(), BindingError> {
        let models = self
            .allowed
            .get(&selection.provider)
            .ok_or_else(|| BindingError::InvalidProvider(selection.provider.to_string()))?;

        if selection.credential.is_empty() {
            return Err(BindingError::MissingCredential);
        }

        if !models.iter().any(|m| *m == selection.model_name) {
            return Err(BindingError::ModelNotAllowed {
                provider: selection.provider.to_string(),
                model: selection.model_name.clone(),
            });
        }

        Ok(())
    }

    /// Bind a template to a freshly constructed model client.
    pub fn build(
        &self,
        selection: &ModelSelection,
        template: PromptTemplate,
    ) -> Result<ChatBinding, BindingError> {
        self.validate(selection)?;

        info!(
            provider = %selection.provider,
            model = %selection.model_name,
            credential = %selection.credential.masked(),
            "Binding model"
        );

        let client = self
            .clients
            .create(
                selection.provider,
                &selection.model_name,
                &selection.credential,
            )
            .map_err(|e| BindingError::ClientInit(e.to_string()))?;

        debug!(client = client.name(), "Model client ready");

        Ok(ChatBinding {
            template,
            client,
            provider: selection.provider,
            model: selection.model_name.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        })
    }
}

/// A prompt template bound to a model client.
///
/// Holds no conversation state: history is supplied on every call.
pub struct ChatBinding {
    template: PromptTemplate,
    client: Arc<dyn Provider>,
    provider: ProviderKind,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl ChatBinding {
    /// Render the template with `history` and `input`, then start streaming.
    pub async fn invoke(&self, history: &[Turn], input: &str) -> Result<ChunkReceiver, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: self.template.render(history, input),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        debug!(model = %self.model, messages = request.messages.len(), "Invoking binding");
        self.client.stream(request).await
    }

    pub fn system_instruction(&self) -> &str {
        self.template.system_instruction()
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for ChatBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatBinding")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("client", &self.client.name())
            .finish_non_exhaustive()
    }
}
