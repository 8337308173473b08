//! Error types for the Oraculo domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`SessionError`] wraps the
//! loader and binding ones that surface through session operations.

use thiserror::Error;

use crate::source::SourceKind;

// --- Bounded context errors ---

/// Failures produced by the content loader dispatcher.
///
/// Every extractor fault is normalized into one of these before it leaves
/// the loader; nothing from an extractor propagates as a panic.
#[derive(Debug, Clone, Error)]
pub enum LoaderError {
    #[error("Invalid source kind: {0}")]
    InvalidSourceKind(String),

    #[error("Payload does not match source kind {kind}")]
    PayloadMismatch { kind: SourceKind },

    #[error("Failed to extract {kind} content: {reason}")]
    Extraction { kind: SourceKind, reason: String },

    #[error("Extractor returned no content for {kind} source")]
    EmptyDocument { kind: SourceKind },

    #[error("Temporary file error: {0}")]
    TempFile(String),
}

/// Failures raised by a model client, synchronously or mid-stream.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Client initialization failed: {0}")]
    ClientInit(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures while validating a model selection and building a chat binding.
#[derive(Debug, Clone, Error)]
pub enum BindingError {
    #[error("Invalid provider: {0}")]
    InvalidProvider(String),

    #[error("Model '{model}' is not available for provider {provider}")]
    ModelNotAllowed { provider: String, model: String },

    #[error("Credential is empty")]
    MissingCredential,

    #[error("Failed to initialize model client: {0}")]
    ClientInit(String),
}

/// Failures of the session-facing operations.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Session is not initialized; load a source before chatting")]
    NotInitialized,

    #[error("A response is already streaming for this session")]
    Busy,

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Binding(#[from] BindingError),
}
