//! Conversation memory implementations for Oraculo.

pub mod in_memory;
pub mod transcript;

pub use in_memory::InMemoryConversation;
pub use transcript::render_transcript;
