//! Conversation memory trait: the ordered log of turns for one session.
//!
//! Memory is append-only during a session. The only operation that removes
//! data is [`ConversationMemory::clear`], which replaces the whole log with an
//! empty one. Insertion order is the chronological replay order used both for
//! prompting and for rendering the transcript.

use async_trait::async_trait;

use crate::message::Turn;

/// Storage for a session's conversation turns.
///
/// Implementations must serialize `append`, `clear`, and `snapshot` against
/// each other so a replayed history is never observed half-cleared.
#[async_trait]
pub trait ConversationMemory: Send + Sync {
    /// The backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Append a single turn at the end of the log.
    async fn append(&self, turn: Turn);

    /// Append several turns atomically, in order.
    async fn append_all(&self, turns: Vec<Turn>) {
        for turn in turns {
            self.append(turn).await;
        }
    }

    /// A read-only copy of the log, oldest first.
    async fn snapshot(&self) -> Vec<Turn>;

    /// Number of turns recorded.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every turn.
    async fn clear(&self);
}
