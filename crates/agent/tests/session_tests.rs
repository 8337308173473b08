//! Session scenarios across loader, prompt, binding and memory.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use oraculo_agent::{BindingFactory, PromptComposer, Session, SessionState, TurnEvent};
use oraculo_core::error::{BindingError, LoaderError, ProviderError, SessionError};
use oraculo_core::extractor::{FileExtractor, UrlExtractor};
use oraculo_core::message::Role;
use oraculo_core::provider::{ChunkReceiver, ClientFactory, Provider, ProviderRequest, StreamChunk};
use oraculo_core::selection::{Credential, ModelSelection, ProviderKind};
use oraculo_core::source::{SourceKind, SourceSpec};
use oraculo_loaders::{ContentLoader, CsvExtractor, PlainTextExtractor};
use oraculo_memory::InMemoryConversation;
use tokio::sync::{Notify, mpsc};

const FALLBACK: &str = "Sorry, an error occurred while processing your request.";

// ── Test doubles ─────────────────────────────────────────────────────────

enum Step {
    Text(&'static str),
    Fail(&'static str),
    Wait(Arc<Notify>),
}

/// Plays back one script per `stream` call.
#[derive(Default)]
struct ScriptedProvider {
    scripts: Mutex<VecDeque<Vec<Step>>>,
}

impl ScriptedProvider {
    fn push(&self, script: Vec<Step>) {
        self.scripts.lock().unwrap().push_back(script);
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream(&self, _request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        let script = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            for step in script {
                match step {
                    Step::Text(text) => {
                        if tx.send(Ok(StreamChunk::text(text))).await.is_err() {
                            return;
                        }
                    }
                    Step::Fail(reason) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(reason.into())))
                            .await;
                        return;
                    }
                    Step::Wait(notify) => notify.notified().await,
                }
            }
            let _ = tx.send(Ok(StreamChunk::done())).await;
        });
        Ok(rx)
    }
}

/// Accepts the request and never answers it.
struct StalledProvider;

#[async_trait]
impl Provider for StalledProvider {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn stream(&self, _request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        std::future::pending().await
    }
}

struct ScriptedFactory(Arc<dyn Provider>);

impl ClientFactory for ScriptedFactory {
    fn create(
        &self,
        _provider: ProviderKind,
        _model: &str,
        _credential: &Credential,
    ) -> Result<Arc<dyn Provider>, ProviderError> {
        Ok(self.0.clone())
    }
}

struct RejectingFactory;

impl ClientFactory for RejectingFactory {
    fn create(
        &self,
        _provider: ProviderKind,
        _model: &str,
        _credential: &Credential,
    ) -> Result<Arc<dyn Provider>, ProviderError> {
        Err(ProviderError::ClientInit("invalid API key format".into()))
    }
}

struct StaticPage(&'static str);

#[async_trait]
impl UrlExtractor for StaticPage {
    fn name(&self) -> &str {
        "static_page"
    }

    async fn extract_from_url(&self, _url: &str) -> Result<String, String> {
        Ok(self.0.to_string())
    }
}

struct NoPdf;

#[async_trait]
impl FileExtractor for NoPdf {
    fn name(&self) -> &str {
        "no_pdf"
    }

    async fn extract_from_file(&self, _path: &Path) -> Result<String, String> {
        Err("pdf support disabled".into())
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

fn loader(page: &'static str) -> ContentLoader {
    ContentLoader::new(
        Arc::new(StaticPage(page)),
        Arc::new(StaticPage("video transcript")),
        Arc::new(NoPdf),
        Arc::new(CsvExtractor),
        Arc::new(PlainTextExtractor),
    )
}

fn session_with(clients: Arc<dyn ClientFactory>, page: &'static str) -> Session {
    let factory =
        BindingFactory::new(clients).allow_models(ProviderKind::OpenAi, ["gpt-4o-mini", "gpt-4o"]);
    Session::new(
        loader(page),
        PromptComposer::default(),
        factory,
        Arc::new(InMemoryConversation::new()),
    )
    .with_fallback_message(FALLBACK)
}

fn scripted_session() -> (Session, Arc<ScriptedProvider>) {
    let provider = Arc::new(ScriptedProvider::default());
    let session = session_with(Arc::new(ScriptedFactory(provider.clone())), "page text");
    (session, provider)
}

fn selection() -> ModelSelection {
    ModelSelection::parse("OpenAI", "gpt-4o-mini", "sk-test").unwrap()
}

fn hello_source() -> SourceSpec {
    SourceSpec::bytes(SourceKind::Text, "hello world")
}

async fn drain(mut events: mpsc::Receiver<TurnEvent>) -> Vec<TurnEvent> {
    let mut all = Vec::new();
    while let Some(event) = events.recv().await {
        all.push(event);
    }
    all
}

fn roles(session_history: &[oraculo_core::message::Turn]) -> Vec<Role> {
    session_history.iter().map(|t| t.role()).collect()
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn text_source_end_to_end() {
    let (session, provider) = scripted_session();
    assert_eq!(session.state().await, SessionState::Uninitialized);

    session.initialize(hello_source(), selection()).await.unwrap();
    assert_eq!(session.state().await, SessionState::Ready);
    assert!(
        session
            .system_instruction()
            .await
            .unwrap()
            .contains("####\nhello world\n####")
    );

    provider.push(vec![Step::Text("It "), Step::Text("says "), Step::Text("hello world.")]);
    let events = drain(session.submit_turn("what does the doc say?").await.unwrap()).await;

    let chunks: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            TurnEvent::Chunk { content } => Some(content.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(chunks, ["It ", "says ", "hello world."]);
    assert_eq!(
        events.last(),
        Some(&TurnEvent::Done {
            response: "It says hello world.".into(),
            fallback: false,
        })
    );

    let history = session.get_history().await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content(), "what does the doc say?");
    assert_eq!(history[1].content(), "It says hello world.");
    assert_eq!(roles(&history), [Role::User, Role::Assistant]);
    assert_eq!(session.state().await, SessionState::Ready);
}

#[tokio::test]
async fn dollar_signs_are_replaced_in_stream_and_history() {
    let (session, provider) = scripted_session();
    session.initialize(hello_source(), selection()).await.unwrap();

    provider.push(vec![Step::Text("Price: $"), Step::Text("5")]);
    let events = drain(session.submit_turn("how much?").await.unwrap()).await;

    for event in &events {
        if let TurnEvent::Chunk { content } = event {
            assert!(!content.contains('$'));
        }
    }
    let history = session.get_history().await;
    assert_eq!(history[1].content(), "Price: S5");
}

#[tokio::test]
async fn submit_before_initialize_is_rejected() {
    let (session, _provider) = scripted_session();

    let err = session.submit_turn("hello?").await.unwrap_err();
    assert!(matches!(err, SessionError::NotInitialized));
    assert!(session.get_history().await.is_empty());
    assert_eq!(session.state().await, SessionState::Uninitialized);
}

#[tokio::test]
async fn mid_stream_fault_records_fallback() {
    let (session, provider) = scripted_session();
    session.initialize(hello_source(), selection()).await.unwrap();

    provider.push(vec![Step::Text("partial "), Step::Fail("connection reset")]);
    let events = drain(session.submit_turn("first?").await.unwrap()).await;

    assert!(events.iter().any(|e| matches!(e, TurnEvent::Error { .. })));
    assert_eq!(
        events.last(),
        Some(&TurnEvent::Done {
            response: FALLBACK.into(),
            fallback: true,
        })
    );

    provider.push(vec![Step::Text("fine now")]);
    let reply = session.submit_turn_collect("second?").await.unwrap();
    assert_eq!(reply, "fine now");

    let history = session.get_history().await;
    assert_eq!(
        roles(&history),
        [Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
    assert_eq!(history[1].content(), FALLBACK);
    assert_eq!(history[3].content(), "fine now");
}

#[tokio::test]
async fn concurrent_submit_is_rejected_as_busy() {
    let (session, provider) = scripted_session();
    session.initialize(hello_source(), selection()).await.unwrap();

    let gate = Arc::new(Notify::new());
    provider.push(vec![Step::Text("a"), Step::Wait(gate.clone()), Step::Text("b")]);

    let first = session.submit_turn("first").await.unwrap();
    let err = session.submit_turn("second").await.unwrap_err();
    assert!(matches!(err, SessionError::Busy));
    assert_eq!(session.state().await, SessionState::Streaming);

    gate.notify_one();
    drain(first).await;

    let history = session.get_history().await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content(), "first");
    assert_eq!(history[1].content(), "ab");

    // Free again once the turn reports done
    provider.push(vec![Step::Text("c")]);
    assert_eq!(session.submit_turn_collect("third").await.unwrap(), "c");
    assert_eq!(session.get_history().await.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn silent_stream_times_out_into_fallback() {
    let (session, provider) = scripted_session();
    let session = session.with_stream_timeout(Duration::from_secs(5));
    session
        .initialize(SourceSpec::url(SourceKind::Site, "https://example.com"), selection())
        .await
        .unwrap();

    let never = Arc::new(Notify::new());
    provider.push(vec![Step::Text("thinking"), Step::Wait(never)]);

    let reply = session.submit_turn_collect("anything?").await.unwrap();
    assert_eq!(reply, FALLBACK);
    assert_eq!(session.get_history().await[1].content(), FALLBACK);
}

#[tokio::test(start_paused = true)]
async fn stalled_request_times_out_and_frees_the_session() {
    let session = session_with(Arc::new(ScriptedFactory(Arc::new(StalledProvider))), "page text")
        .with_stream_timeout(Duration::from_secs(5));
    session
        .initialize(SourceSpec::url(SourceKind::Site, "https://example.com"), selection())
        .await
        .unwrap();

    let reply = tokio::time::timeout(Duration::from_secs(3600), session.submit_turn_collect("q"))
        .await
        .expect("turn should finish once the request times out")
        .unwrap();
    assert_eq!(reply, FALLBACK);
    assert_eq!(session.state().await, SessionState::Ready);

    // Not stuck in Busy: the next turn runs (and times out) too
    let again = tokio::time::timeout(Duration::from_secs(3600), session.submit_turn_collect("q2"))
        .await
        .expect("second turn should not hang")
        .unwrap();
    assert_eq!(again, FALLBACK);
    assert_eq!(
        roles(&session.get_history().await),
        [Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
}

#[tokio::test]
async fn reset_during_stream_keeps_the_pair_whole() {
    let (session, provider) = scripted_session();
    session.initialize(hello_source(), selection()).await.unwrap();
    provider.push(vec![Step::Text("old answer")]);
    session.submit_turn_collect("old question").await.unwrap();

    let gate = Arc::new(Notify::new());
    provider.push(vec![Step::Text("par"), Step::Wait(gate.clone()), Step::Text("tial")]);
    let mut events = session.submit_turn("q").await.unwrap();
    assert!(matches!(events.recv().await, Some(TurnEvent::Chunk { .. })));
    assert_eq!(session.state().await, SessionState::Streaming);

    session.reset_memory().await;
    assert!(session.get_history().await.is_empty());

    gate.notify_one();
    drain(events).await;

    let history = session.get_history().await;
    assert_eq!(roles(&history), [Role::User, Role::Assistant]);
    assert_eq!(history[0].content(), "q");
    assert_eq!(history[1].content(), "partial");
}

#[tokio::test]
async fn reinitialize_with_clear_during_stream_keeps_the_pair_whole() {
    let (session, provider) = scripted_session();
    let session = session.with_clear_history_on_reinit(true);
    session.initialize(hello_source(), selection()).await.unwrap();
    provider.push(vec![Step::Text("old answer")]);
    session.submit_turn_collect("old question").await.unwrap();

    let gate = Arc::new(Notify::new());
    provider.push(vec![Step::Text("in "), Step::Wait(gate.clone()), Step::Text("flight")]);
    let mut events = session.submit_turn("q").await.unwrap();
    assert!(matches!(events.recv().await, Some(TurnEvent::Chunk { .. })));

    session
        .initialize(SourceSpec::url(SourceKind::Site, "https://example.com"), selection())
        .await
        .unwrap();
    assert!(session.get_history().await.is_empty());

    gate.notify_one();
    drain(events).await;

    let history = session.get_history().await;
    assert_eq!(roles(&history), [Role::User, Role::Assistant]);
    assert_eq!(history[0].content(), "q");
    assert_eq!(history[1].content(), "in flight");
    assert!(session.system_instruction().await.unwrap().contains("page text"));
}

#[tokio::test]
async fn dropped_receiver_still_records_a_pair() {
    let (session, provider) = scripted_session();
    session.initialize(hello_source(), selection()).await.unwrap();

    provider.push(vec![Step::Text("one"), Step::Text("two")]);
    drop(session.submit_turn("ignored").await.unwrap());

    for _ in 0..100 {
        if session.get_history().await.len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let history = session.get_history().await;
    assert_eq!(roles(&history), [Role::User, Role::Assistant]);
    assert_eq!(history[1].content(), FALLBACK);
}

#[tokio::test]
async fn reset_memory_empties_history_and_keeps_binding() {
    let (session, provider) = scripted_session();
    session.initialize(hello_source(), selection()).await.unwrap();
    provider.push(vec![Step::Text("hi")]);
    session.submit_turn_collect("hello").await.unwrap();

    session.reset_memory().await;
    assert!(session.get_history().await.is_empty());
    assert_eq!(session.state().await, SessionState::Ready);

    // Reset on an uninitialized session is fine too
    let (fresh, _) = scripted_session();
    fresh.reset_memory().await;
    assert!(fresh.get_history().await.is_empty());
}

#[tokio::test]
async fn reinitialize_replaces_binding_and_keeps_history() {
    let (session, provider) = scripted_session();
    session.initialize(hello_source(), selection()).await.unwrap();
    provider.push(vec![Step::Text("about hello")]);
    session.submit_turn_collect("q1").await.unwrap();

    session
        .initialize(SourceSpec::url(SourceKind::Site, "https://example.com"), selection())
        .await
        .unwrap();

    let instruction = session.system_instruction().await.unwrap();
    assert!(instruction.contains("page text"));
    assert!(!instruction.contains("hello world"));
    assert_eq!(session.get_history().await.len(), 2);
}

#[tokio::test]
async fn reinitialize_can_clear_history() {
    let (session, provider) = scripted_session();
    let session = session.with_clear_history_on_reinit(true);
    session.initialize(hello_source(), selection()).await.unwrap();
    provider.push(vec![Step::Text("x")]);
    session.submit_turn_collect("q1").await.unwrap();

    session.initialize(hello_source(), selection()).await.unwrap();
    assert!(session.get_history().await.is_empty());
}

#[tokio::test]
async fn failed_initialize_keeps_previous_binding() {
    let (session, _provider) = scripted_session();
    session.initialize(hello_source(), selection()).await.unwrap();

    let err = session
        .initialize(SourceSpec::url(SourceKind::Text, "https://example.com"), selection())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Loader(LoaderError::PayloadMismatch { .. })
    ));
    assert_eq!(session.state().await, SessionState::Ready);
    assert!(session.system_instruction().await.unwrap().contains("hello world"));
}

#[tokio::test]
async fn extraction_failure_leaves_session_uninitialized() {
    let (session, _provider) = scripted_session();
    let err = session
        .initialize(SourceSpec::bytes(SourceKind::Pdf, b"%PDF-1.4".to_vec()), selection())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Loader(LoaderError::Extraction { kind: SourceKind::Pdf, .. })
    ));
    assert_eq!(session.state().await, SessionState::Uninitialized);
}

#[tokio::test]
async fn bot_challenge_page_initializes_with_reload_hint() {
    let provider = Arc::new(ScriptedProvider::default());
    let session = session_with(
        Arc::new(ScriptedFactory(provider)),
        "Just a moment...Enable JavaScript and cookies to continue",
    );

    session
        .initialize(SourceSpec::url(SourceKind::Site, "https://example.com"), selection())
        .await
        .unwrap();
    let instruction = session.system_instruction().await.unwrap();
    assert!(instruction.contains("from a Site document"));
    assert!(instruction.contains("load Oracle again"));
}

#[tokio::test]
async fn empty_credential_fails_before_loading() {
    let (session, _provider) = scripted_session();
    let selection = ModelSelection::parse("OpenAI", "gpt-4o-mini", "").unwrap();

    // The source is also invalid; the credential check must win
    let err = session
        .initialize(SourceSpec::url(SourceKind::Text, "https://example.com"), selection)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Binding(BindingError::MissingCredential)
    ));
    assert_eq!(session.state().await, SessionState::Uninitialized);
}

#[tokio::test]
async fn unregistered_provider_is_invalid() {
    let provider = Arc::new(ScriptedProvider::default());
    let session = Session::new(
        loader("page"),
        PromptComposer::default(),
        BindingFactory::new(Arc::new(ScriptedFactory(provider))),
        Arc::new(InMemoryConversation::new()),
    );

    let err = session.initialize(hello_source(), selection()).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Binding(BindingError::InvalidProvider(_))
    ));
}

#[tokio::test]
async fn client_construction_fault_is_reported() {
    let session = session_with(Arc::new(RejectingFactory), "page");
    let err = session.initialize(hello_source(), selection()).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Binding(BindingError::ClientInit(ref m)) if m.contains("invalid API key format")
    ));
    assert_eq!(session.state().await, SessionState::Uninitialized);
}

#[tokio::test]
async fn model_outside_allow_list_is_rejected() {
    let (session, _provider) = scripted_session();
    let selection = ModelSelection::parse("openai", "gpt-2", "sk-test").unwrap();
    let err = session.initialize(hello_source(), selection).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Binding(BindingError::ModelNotAllowed { .. })
    ));
}
