use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ephemeral::providers::gemini::GeminiProvider;
use ephemeral::session::Session;
use tracing_subscriber::EnvFilter;

mod attachments;
mod configuration;
mod error;
mod prompt;
mod session;

use configuration::Settings;
use prompt::rustyline::RustylinePrompt;
use session::ChatSession;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (defaults to ~/.config/ephemeral/config.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model to use, overriding configuration
    #[arg(short, long)]
    model: Option<String>,

    /// Gemini API key (can also be set via GOOGLE_API_KEY environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// Log debug output to stderr
    #[arg(long)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let default_directive = if debug { "ephemeral=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.debug);

    let mut overrides = Vec::new();
    if let Some(model) = cli.model {
        overrides.push(("provider.model", model));
    }
    if let Some(api_key) = cli.api_key {
        overrides.push(("provider.api_key", api_key));
    }
    let settings = Settings::load(cli.config.as_deref(), &overrides)?;
    tracing::debug!(model = %settings.provider.model, host = %settings.provider.host, "loaded settings");

    let provider = GeminiProvider::new(settings.provider.into_config())
        .context("Failed to create the Gemini client")?;
    let prompt = RustylinePrompt::new()?;

    let mut chat = ChatSession::new(
        Session::new(settings.labels.into()),
        &provider,
        Box::new(prompt),
    );
    chat.start().await?;
    tracing::debug!(
        turns = chat.session().transcript().turns().len(),
        "session ended"
    );
    Ok(())
}
