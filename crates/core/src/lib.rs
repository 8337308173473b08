//! # Oraculo Core
//!
//! Domain types, traits, and error definitions for the Oraculo
//! document-grounded chat engine. It depends on nothing heavier than
//! `tokio`'s channel and `AsyncRead` types; it defines the domain model that
//! all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (content extractors, model clients,
//! conversation storage) is defined as a trait here. Implementations live in
//! their respective crates, so the session engine can be driven by stubs in
//! tests and by real HTTP clients in production.

pub mod error;
pub mod extractor;
pub mod memory;
pub mod message;
pub mod provider;
pub mod selection;
pub mod source;

// Re-export key types at crate root for ergonomics
pub use error::{BindingError, LoaderError, ProviderError, SessionError};
pub use extractor::{FileExtractor, UrlExtractor};
pub use memory::ConversationMemory;
pub use message::{Message, Role, Turn};
pub use provider::{ChunkReceiver, ClientFactory, Provider, ProviderRequest, StreamChunk, Usage};
pub use selection::{Credential, ModelSelection, ProviderKind};
pub use source::{ExtractedDocument, SourceKind, SourcePayload, SourceSpec};
