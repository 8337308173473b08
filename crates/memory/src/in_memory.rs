//! In-memory conversation log: lives exactly as long as its session.

use async_trait::async_trait;
use oraculo_core::memory::ConversationMemory;
use oraculo_core::message::Turn;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// An in-memory conversation log backed by a `Vec`.
///
/// Cloning shares the same underlying log.
#[derive(Clone)]
pub struct InMemoryConversation {
    turns: Arc<RwLock<Vec<Turn>>>,
}

impl InMemoryConversation {
    pub fn new() -> Self {
        Self {
            turns: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryConversation {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationMemory for InMemoryConversation {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, turn: Turn) {
        self.turns.write().await.push(turn);
    }

    async fn append_all(&self, turns: Vec<Turn>) {
        // Single write guard so a pair is never split by a concurrent reader
        self.turns.write().await.extend(turns);
    }

    async fn snapshot(&self) -> Vec<Turn> {
        self.turns.read().await.clone()
    }

    async fn len(&self) -> usize {
        self.turns.read().await.len()
    }

    async fn clear(&self) {
        let mut turns = self.turns.write().await;
        debug!(dropped = turns.len(), "Clearing conversation memory");
        *turns = Vec::new();
    }
}
