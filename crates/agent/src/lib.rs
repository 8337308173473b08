//! The chat side of Oraculo.
//!
//! A [`Session`] ties the pieces together for one conversation:
//!
//! 1. **Load** the source through the content loader
//! 2. **Compose** a prompt template around the extracted text
//! 3. **Bind** the template to the selected model client
//! 4. **Stream** each turn, recording the user/assistant pair in memory
//!
//! Re-initializing swaps the binding; the conversation log lives in the
//! session and survives unless explicitly cleared.

pub mod binding;
pub mod prompt;
pub mod session;
pub mod stream_event;

pub use binding::{BindingFactory, ChatBinding};
pub use prompt::{PromptComposer, PromptTemplate};
pub use session::{Session, SessionState};
pub use stream_event::TurnEvent;
