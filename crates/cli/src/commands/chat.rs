//! `oraculo chat`: load a source, then chat about it.

use std::io::Write;
use std::path::{Path, PathBuf};

use oraculo_agent::{Session, TurnEvent};
use oraculo_config::AppConfig;
use oraculo_core::error::LoaderError;
use oraculo_core::selection::{ModelSelection, ProviderKind};
use oraculo_core::source::{SourceKind, SourcePayload, SourceSpec};
use oraculo_memory::render_transcript;
use tokio::io::{AsyncBufReadExt, BufReader};

pub struct ChatArgs {
    pub source_type: Option<String>,
    pub url: Option<String>,
    pub file: Option<PathBuf>,
    pub model: Option<String>,
    pub message: Option<String>,
}

pub async fn run(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for API key early, give a clear error
    let Some(credential) = config.credential() else {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    ORACULO_API_KEY = 'sk-...'");
        eprintln!("    OPENAI_API_KEY  = 'sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    };

    let kind = resolve_kind(
        args.source_type.as_deref(),
        args.url.as_deref(),
        args.file.as_deref(),
    )?;
    let source = open_source(kind, args.url, args.file.as_deref()).await?;

    let provider: ProviderKind = config.default_provider.parse()?;
    let model = args.model.unwrap_or_else(|| config.default_model.clone());
    let selection = ModelSelection::new(provider, model.as_str(), credential);
    tracing::debug!(kind = %kind, provider = %provider, model = %model, "Starting chat");

    let session = Session::from_config(&config)?;
    let persona = config.session.persona_name.as_str();

    eprint!("  Loading {kind} source...");
    let initialized = session.initialize(source, selection).await;
    eprint!("\r                              \r");
    initialized.map_err(|e| format!("Failed to initialize {persona}: {e}"))?;

    if let Some(msg) = args.message {
        // Single message mode
        stream_turn(&session, persona, &msg).await?;
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  {persona} is ready.");
    println!();
    println!("  Provider:  {provider}");
    println!("  Model:     {model}");
    println!("  Source:    {kind}");
    println!();
    println!("  Type your question and press Enter.");
    println!("  Commands: /history, /clear, /exit");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "" => continue,
            "/exit" | "/quit" | "exit" => break,
            "/clear" => {
                session.reset_memory().await;
                println!("  History cleared.");
            }
            "/history" => {
                let history = session.get_history().await;
                if history.is_empty() {
                    println!("  (no messages yet)");
                } else {
                    println!("{}", render_transcript(&history, persona));
                }
            }
            input => {
                if let Err(e) = stream_turn(&session, persona, input).await {
                    eprintln!("  [Error] {e}");
                }
            }
        }
        println!();
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

/// Print a turn as it streams.
async fn stream_turn(
    session: &Session,
    persona: &str,
    input: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut events = session.submit_turn(input).await?;
    let mut stdout = std::io::stdout();

    print!("  {persona} > ");
    stdout.flush()?;

    while let Some(event) = events.recv().await {
        match event {
            TurnEvent::Chunk { content } => {
                print!("{content}");
                stdout.flush()?;
            }
            TurnEvent::Error { message } => {
                println!();
                eprintln!("  [Error] {message}");
            }
            TurnEvent::Done { response, fallback } => {
                if fallback {
                    print!("  {persona} > {response}");
                }
                println!();
            }
        }
    }

    Ok(())
}

/// Work out the source kind from the explicit label, the URL host or the
/// file extension.
fn resolve_kind(
    source_type: Option<&str>,
    url: Option<&str>,
    file: Option<&Path>,
) -> Result<SourceKind, String> {
    if let Some(label) = source_type {
        return label.parse().map_err(|e: LoaderError| e.to_string());
    }

    match (url, file) {
        (Some(url), _) if url.contains("youtube.com/") || url.contains("youtu.be/") => {
            Ok(SourceKind::Video)
        }
        (Some(_), _) => Ok(SourceKind::Site),
        (None, Some(path)) => {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase);
            Ok(match ext.as_deref() {
                Some("pdf") => SourceKind::Pdf,
                Some("csv") => SourceKind::Csv,
                _ => SourceKind::Text,
            })
        }
        (None, None) => Err("Provide a source with --url or --file".into()),
    }
}

async fn open_source(
    kind: SourceKind,
    url: Option<String>,
    file: Option<&Path>,
) -> Result<SourceSpec, String> {
    if kind.is_url() {
        let url = url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| format!("A {kind} source needs --url"))?;
        return Ok(SourceSpec::url(kind, url));
    }

    let path = file.ok_or_else(|| format!("A {kind} source needs --file"))?;
    let handle = tokio::fs::File::open(path)
        .await
        .map_err(|e| format!("Cannot open {}: {e}", path.display()))?;
    Ok(SourceSpec::new(kind, SourcePayload::reader(handle)))
}
