//! Model selection: which provider, which model, and which credential.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BindingError;

/// The supported model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "OpenAI")]
    OpenAi,
}

impl ProviderKind {
    /// The registry key for this provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            _ => Err(BindingError::InvalidProvider(s.to_string())),
        }
    }
}

/// An opaque API credential.
///
/// Never printed in full: `Debug` is redacted and [`Credential::masked`]
/// shows only the first four characters.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// First four characters followed by `****`.
    pub fn masked(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        format!("{prefix}****")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// A provider/model/credential triple chosen by the user.
///
/// Only the provider is checked on construction; the model allow-list and
/// the credential are validated by the binding factory against the registry.
#[derive(Debug, Clone)]
pub struct ModelSelection {
    pub provider: ProviderKind,
    pub model_name: String,
    pub credential: Credential,
}

impl ModelSelection {
    pub fn new(provider: ProviderKind, model_name: impl Into<String>, credential: Credential) -> Self {
        Self {
            provider,
            model_name: model_name.into(),
            credential,
        }
    }

    /// Build a selection from the raw values the presentation layer collects.
    pub fn parse(
        provider: &str,
        model_name: &str,
        credential: impl Into<String>,
    ) -> Result<Self, BindingError> {
        Ok(Self::new(
            provider.parse()?,
            model_name.trim(),
            Credential::new(credential),
        ))
    }
}
