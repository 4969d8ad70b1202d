mod chat_client;
mod cli;
mod config;
mod error;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::chat_client::ChatClient;
use crate::cli::chat::input_source::SpeechCapability;
use crate::cli::chat::ChatContext;
use crate::cli::signup::View;
use crate::config::{Config, ConfigArgs};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Send a single query, print the reply and exit
    #[arg(short, long)]
    input: Option<String>,

    /// Chat endpoint URL (falls back to CHAT_ENDPOINT)
    #[arg(long)]
    endpoint: Option<String>,

    /// Request timeout in seconds (falls back to CHAT_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// JSON file of speech events to replay as voice input
    #[arg(long)]
    speech_script: Option<PathBuf>,

    /// Start with the light palette
    #[arg(long)]
    light: bool,

    /// Name used in the greeting (falls back to CHAT_USER_NAME, then the login user)
    #[arg(long)]
    user_name: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a chat session
    Chat,
    /// Show the signup screen, then start a chat session
    Signup,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let view = match cli.command {
        Some(Commands::Signup) => View::Signup,
        Some(Commands::Chat) | None => View::Chat,
    };

    let config = Config::resolve(ConfigArgs {
        endpoint: cli.endpoint,
        timeout_secs: cli.timeout_secs,
        speech_script: cli.speech_script,
        light: cli.light,
        user_name: cli.user_name,
    })?;

    info!("Starting ArogyaMind chat against {}", config.endpoint);

    let client = ChatClient::new(config.endpoint.clone(), config.timeout)?;
    let capability = SpeechCapability::detect(config.speech_script.as_deref())?;

    let mut chat_context = ChatContext::new(
        Box::new(io::stdout()),
        cli.input,
        view,
        &config,
        Box::new(client),
        capability,
    );
    chat_context.run().await
}
