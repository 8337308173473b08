//! The chat session: loads a source, binds a model and runs turns.
//!
//! ```text
//! Uninitialized ──initialize──▶ Ready ──submit_turn──▶ Streaming ──▶ Ready
//! ```
//!
//! Every submitted turn records exactly one user turn followed by one
//! assistant turn. When the response fails mid-stream the assistant turn is
//! the configured fallback message, so the log keeps strict alternation.

use std::sync::Arc;
use std::time::Duration;

use oraculo_config::AppConfig;
use oraculo_core::error::{ProviderError, SessionError};
use oraculo_core::memory::ConversationMemory;
use oraculo_core::message::Turn;
use oraculo_core::selection::ModelSelection;
use oraculo_core::source::SourceSpec;
use oraculo_loaders::ContentLoader;
use oraculo_memory::InMemoryConversation;
use oraculo_providers::OpenAiClientFactory;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, mpsc};
use tracing::{debug, info, warn};

use crate::binding::{BindingFactory, ChatBinding};
use crate::prompt::PromptComposer;
use crate::stream_event::TurnEvent;

const EVENT_BUFFER: usize = 64;
const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_FALLBACK: &str = "Sorry, an error occurred while processing your request.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No binding yet; turns are rejected.
    Uninitialized,
    Ready,
    /// A turn is in flight.
    Streaming,
}

/// One conversation grounded on one source at a time.
pub struct Session {
    binding: RwLock<Option<Arc<ChatBinding>>>,
    memory: Arc<dyn ConversationMemory>,
    /// Held for the whole lifetime of a turn
    turn_lock: Arc<Mutex<()>>,
    loader: ContentLoader,
    composer: PromptComposer,
    factory: BindingFactory,
    fallback_message: String,
    stream_timeout: Duration,
    clear_history_on_reinit: bool,
}

impl Session {
    pub fn new(
        loader: ContentLoader,
        composer: PromptComposer,
        factory: BindingFactory,
        memory: Arc<dyn ConversationMemory>,
    ) -> Self {
        Self {
            binding: RwLock::new(None),
            memory,
            turn_lock: Arc::new(Mutex::new(())),
            loader,
            composer,
            factory,
            fallback_message: DEFAULT_FALLBACK.into(),
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
            clear_history_on_reinit: false,
        }
    }

    /// Wire a session with the built-in loaders, the OpenAI client factory
    /// and in-process memory.
    pub fn from_config(config: &AppConfig) -> Result<Self, SessionError> {
        let loader = oraculo_loaders::default_loader(&config.loaders)?;
        let factory =
            BindingFactory::from_config(config, Arc::new(OpenAiClientFactory::from_config(config)));

        Ok(Self::new(
            loader,
            PromptComposer::new(config.session.persona_name.as_str()),
            factory,
            Arc::new(InMemoryConversation::new()),
        )
        .with_fallback_message(config.session.fallback_message.as_str())
        .with_stream_timeout(Duration::from_secs(config.session.stream_timeout_secs))
        .with_clear_history_on_reinit(config.session.clear_history_on_reinit))
    }

    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    /// Maximum wait for the next chunk before the turn counts as failed.
    pub fn with_stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    pub fn with_clear_history_on_reinit(mut self, clear: bool) -> Self {
        self.clear_history_on_reinit = clear;
        self
    }

    pub async fn state(&self) -> SessionState {
        if self.binding.read().await.is_none() {
            SessionState::Uninitialized
        } else if self.turn_lock.try_lock().is_err() {
            SessionState::Streaming
        } else {
            SessionState::Ready
        }
    }

    /// Load `source`, compose its prompt and bind the selected model.
    ///
    /// The selection is checked before any extraction work. On failure the
    /// session keeps whatever binding it had. On success the new binding
    /// replaces the old one wholesale; history is kept unless the session
    /// was built to clear it on re-initialization.
    pub async fn initialize(
        &self,
        source: SourceSpec,
        selection: ModelSelection,
    ) -> Result<(), SessionError> {
        self.factory.validate(&selection)?;

        info!(
            kind = %source.kind,
            provider = %selection.provider,
            model = %selection.model_name,
            credential = %selection.credential.masked(),
            "Initializing session"
        );

        let document = self.loader.load(source).await?;
        let template = self.composer.compose(document);
        let binding = self.factory.build(&selection, template)?;

        let previous = self.binding.write().await.replace(Arc::new(binding));
        if previous.is_some() && self.clear_history_on_reinit {
            self.memory.clear().await;
            debug!("Cleared history on re-initialization");
        }

        info!(model = %selection.model_name, "Session ready");
        Ok(())
    }

    /// Start a turn and return its event stream.
    ///
    /// Fails with `NotInitialized` before any binding exists and with `Busy`
    /// while another turn is streaming. Neither touches the history.
    pub async fn submit_turn(&self, input: &str) -> Result<mpsc::Receiver<TurnEvent>, SessionError> {
        let binding = self
            .binding
            .read()
            .await
            .clone()
            .ok_or(SessionError::NotInitialized)?;

        let guard = self
            .turn_lock
            .clone()
            .try_lock_owned()
            .map_err(|_| SessionError::Busy)?;

        let history = self.memory.snapshot().await;
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let turn = TurnRunner {
            binding,
            memory: self.memory.clone(),
            input: input.to_string(),
            fallback_message: self.fallback_message.clone(),
            stream_timeout: self.stream_timeout,
        };
        tokio::spawn(turn.run(history, tx, guard));

        Ok(rx)
    }

    /// Run a turn to completion and return the recorded assistant text.
    pub async fn submit_turn_collect(&self, input: &str) -> Result<String, SessionError> {
        let mut events = self.submit_turn(input).await?;
        let mut response = String::new();
        while let Some(event) = events.recv().await {
            match event {
                TurnEvent::Chunk { content } => response.push_str(&content),
                TurnEvent::Error { .. } => {}
                TurnEvent::Done { response: recorded, .. } => return Ok(recorded),
            }
        }
        Ok(response)
    }

    /// Empty the conversation log. The binding is untouched.
    pub async fn reset_memory(&self) {
        self.memory.clear().await;
        info!("Conversation history cleared");
    }

    /// The conversation so far, oldest first.
    pub async fn get_history(&self) -> Vec<Turn> {
        self.memory.snapshot().await
    }

    /// The system instruction of the current binding, if any.
    pub async fn system_instruction(&self) -> Option<String> {
        self.binding
            .read()
            .await
            .as_ref()
            .map(|b| b.system_instruction().to_string())
    }

    /// Model name of the current binding, if any.
    pub async fn model(&self) -> Option<String> {
        self.binding.read().await.as_ref().map(|b| b.model().to_string())
    }

    pub fn binding_factory(&self) -> &BindingFactory {
        &self.factory
    }
}

/// A single in-flight turn, owned by its task.
struct TurnRunner {
    binding: Arc<ChatBinding>,
    memory: Arc<dyn ConversationMemory>,
    input: String,
    fallback_message: String,
    stream_timeout: Duration,
}

impl TurnRunner {
    async fn run(
        self,
        history: Vec<Turn>,
        events: mpsc::Sender<TurnEvent>,
        guard: OwnedMutexGuard<()>,
    ) {
        let (response, fallback) = match self.stream_response(&history, &events).await {
            Ok(text) => (text, false),
            Err(e) => {
                warn!(error = %e, "Response failed, recording fallback");
                let _ = events
                    .send(TurnEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
                (self.fallback_message.clone(), true)
            }
        };

        self.memory
            .append_all(vec![Turn::user(self.input), Turn::assistant(response.as_str())])
            .await;

        // Release before `done` so the caller can submit right away
        drop(guard);

        let _ = events.send(TurnEvent::Done { response, fallback }).await;
    }

    /// Consume the model stream in order, forwarding sanitized chunks.
    async fn stream_response(
        &self,
        history: &[Turn],
        events: &mpsc::Sender<TurnEvent>,
    ) -> Result<String, ProviderError> {
        let timed_out = || {
            ProviderError::Timeout(format!("no output for {}s", self.stream_timeout.as_secs()))
        };

        let mut chunks = tokio::time::timeout(
            self.stream_timeout,
            self.binding.invoke(history, &self.input),
        )
        .await
        .map_err(|_| timed_out())??;
        let mut response = String::new();
        let mut count = 0usize;

        loop {
            let next = tokio::time::timeout(self.stream_timeout, chunks.recv())
                .await
                .map_err(|_| timed_out())?;

            let Some(chunk) = next else { break };
            let chunk = chunk?;

            if let Some(content) = chunk.content.filter(|c| !c.is_empty()) {
                let content = sanitize(&content);
                response.push_str(&content);
                count += 1;
                if events.send(TurnEvent::Chunk { content }).await.is_err() {
                    return Err(ProviderError::StreamInterrupted(
                        "turn receiver dropped".into(),
                    ));
                }
            }

            if chunk.done {
                break;
            }
        }

        debug!(chunks = count, chars = response.len(), "Response streamed");
        Ok(response)
    }
}

/// Dollar signs never reach the user or the history.
fn sanitize(text: &str) -> String {
    text.replace('$', "S")
}
