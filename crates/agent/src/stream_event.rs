//! Turn-level streaming events.
//!
//! `TurnEvent` wraps provider stream chunks into the notifications a
//! presentation layer renders while a response is produced.

use serde::{Deserialize, Serialize};

/// Events emitted while a turn streams.
///
/// A turn always ends with exactly one `done`, which carries the text that was
/// recorded as the assistant turn. An `error` before it means the response
/// failed and the fallback message was recorded instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// Sanitized partial text, in arrival order.
    Chunk { content: String },

    /// The response failed mid-stream.
    Error { message: String },

    /// The turn pair has been recorded.
    Done { response: String, fallback: bool },
}

impl TurnEvent {
    /// Event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Chunk { .. } => "chunk",
            Self::Error { .. } => "error",
            Self::Done { .. } => "done",
        }
    }
}
