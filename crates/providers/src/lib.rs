//! LLM Provider implementations for Oraculo.
//!
//! All providers implement the `oraculo_core::Provider` trait. The
//! [`OpenAiClientFactory`] builds them from a model selection.

pub mod factory;
pub mod openai_compat;

pub use factory::OpenAiClientFactory;
pub use openai_compat::OpenAiCompatProvider;
