//! Provider trait: the abstraction over LLM backends.
//!
//! A Provider knows how to send a composed prompt to an LLM and get the
//! response back as a stream of text chunks. A [`ClientFactory`] builds a
//! provider from a model name and credential, and may fault while doing so.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ProviderError;
use crate::message::Message;
use crate::selection::{Credential, ProviderKind};

/// Receiving half of a streamed model response.
pub type ChunkReceiver = mpsc::Receiver<Result<StreamChunk, ProviderError>>;

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-4o-mini")
    pub model: String,

    /// The composed prompt: system instruction, history, then the user turn
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A single chunk in a streaming response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Partial content delta
    #[serde(default)]
    pub content: Option<String>,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,

    /// Usage info (typically only in the final chunk)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl StreamChunk {
    /// A content delta.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            done: false,
            usage: None,
        }
    }

    /// The terminating chunk.
    pub fn done() -> Self {
        Self {
            content: None,
            done: true,
            usage: None,
        }
    }
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. The chat binding calls
/// `stream()` without knowing which backend is in use.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a request and get a stream of response chunks.
    ///
    /// Errors returned here are synchronous failures (the request never
    /// started); failures after that arrive as `Err` items on the channel.
    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError>;

    /// Send a request and wait for the whole response text.
    ///
    /// Default implementation drains `stream()`.
    async fn complete(&self, request: ProviderRequest) -> Result<String, ProviderError> {
        let mut rx = self.stream(request).await?;
        let mut text = String::new();
        while let Some(chunk) = rx.recv().await {
            let chunk = chunk?;
            if let Some(content) = chunk.content {
                text.push_str(&content);
            }
            if chunk.done {
                break;
            }
        }
        Ok(text)
    }
}

/// Builds model clients for a provider.
pub trait ClientFactory: Send + Sync {
    /// Construct a client bound to `model` and authenticated with `credential`.
    ///
    /// Fails with [`ProviderError::ClientInit`] when the client cannot be
    /// constructed (e.g., a credential that is not a valid header value).
    fn create(
        &self,
        provider: ProviderKind,
        model: &str,
        credential: &Credential,
    ) -> Result<Arc<dyn Provider>, ProviderError>;
}
