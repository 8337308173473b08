//! Oraculo CLI: the main entry point.
//!
//! Commands:
//! - `chat`    : Load a source and chat about it (interactive or single message)
//! - `models`  : List providers and the models they offer
//! - `onboard` : Write a default config file

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "oraculo",
    about = "Oraculo: chat with a web page, video, PDF, CSV or text file",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Chat about a source document
    Chat {
        /// Source type: site, video, pdf, csv or text (inferred when omitted)
        #[arg(short = 't', long = "source-type")]
        source_type: Option<String>,

        /// URL of a web page or video
        #[arg(short, long, conflicts_with = "file")]
        url: Option<String>,

        /// Path of a PDF, CSV or text file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Model to use (defaults to the configured model)
        #[arg(long)]
        model: Option<String>,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// List providers and their models
    Models,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat {
            source_type,
            url,
            file,
            model,
            message,
        } => {
            let args = commands::chat::ChatArgs {
                source_type,
                url,
                file,
                model,
                message,
            };
            commands::chat::run(args).await?
        }
        Commands::Models => commands::models::run().await?,
    }

    Ok(())
}
