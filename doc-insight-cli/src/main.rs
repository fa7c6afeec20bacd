//! CLI entry point for doc-insight

mod chat;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::Input;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use doc_insight_api::HttpBackend;
use doc_insight_core::config::{Config, ConfigLoader};
use doc_insight_core::logging::init_logging;
use doc_insight_session::{connectivity, ConnectivityHandle, SessionController};

#[derive(Parser)]
#[command(name = "doc-insight")]
#[command(about = "Ask questions about a document through an insight backend")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,

    /// Backend API base URL (overrides configuration)
    #[arg(short, long, global = true)]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat interactively about a document
    Chat {
        /// Document file to load
        #[arg(short, long)]
        document: PathBuf,
    },
    /// Ask a single question about a document
    Ask {
        /// Document file to load
        #[arg(short, long)]
        document: PathBuf,
        /// The question to ask
        query: String,
    },
    /// Register an API key with the backend for this session
    SetKey {
        /// Key value; prompted for when omitted
        #[arg(short, long)]
        key: Option<String>,
    },
    /// Show configuration information
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_loader = if let Some(dir) = cli.config_dir {
        ConfigLoader::with_dir(dir)
    } else {
        ConfigLoader::new()
    };

    let mut config = config_loader.load()?;
    if let Some(base_url) = cli.base_url {
        config.backend.base_url = base_url;
    }

    let _log_guard = init_logging(&config.logging);

    match cli.command {
        Commands::Chat { document } => {
            info!("Starting interactive chat for {}", document.display());
            chat::run_chat(&config, &document).await?;
        }
        Commands::Ask { document, query } => {
            info!("Processing one-shot question for {}", document.display());
            run_ask(&config, &document, &query).await?;
        }
        Commands::SetKey { key } => {
            run_set_key(&config, key).await?;
        }
        Commands::Status => {
            run_status(&config_loader, &config);
        }
    }

    Ok(())
}

/// Build a session controller over the configured HTTP backend.
///
/// The returned handle drives the controller's connectivity gate; the
/// interactive front end exposes it as a manual toggle.
pub(crate) fn build_controller(config: &Config) -> (SessionController, ConnectivityHandle) {
    let backend = Arc::new(HttpBackend::from_config(&config.backend));
    let (handle, monitor) = connectivity::channel(true);
    let controller =
        SessionController::new(backend, config.backend.key_name.clone(), monitor);
    (controller, handle)
}

/// Load a document file, rejecting blank content up front
pub(crate) fn read_document(path: &Path) -> Result<String> {
    let document = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read document {}: {}", path.display(), e))?;
    if document.trim().is_empty() {
        anyhow::bail!("Document {} is empty", path.display());
    }
    Ok(document)
}

/// Spinner shown while a request is outstanding
pub(crate) fn request_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Processing your request...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// Ask a single question and print the answer
async fn run_ask(config: &Config, document_path: &Path, query: &str) -> Result<()> {
    let document = read_document(document_path)?;
    let (mut controller, _connectivity) = build_controller(config);

    let spinner = request_spinner();
    let result = controller.submit_turn(&document, query).await;
    spinner.finish_and_clear();

    match result {
        Ok(turn) => {
            println!(
                "{} {}",
                style("AI:").green().bold(),
                turn.ai_response.as_deref().unwrap_or_default()
            );
            Ok(())
        }
        Err(_) => {
            let message = controller
                .last_error()
                .unwrap_or("Request failed.")
                .to_string();
            anyhow::bail!(message)
        }
    }
}

/// Register an API key with the backend
async fn run_set_key(config: &Config, key: Option<String>) -> Result<()> {
    let key = match key {
        Some(key) => key,
        None => Input::new()
            .with_prompt("Enter your API Key")
            .interact_text()?,
    };

    let (mut controller, _connectivity) = build_controller(config);
    match controller.set_credential(&key).await {
        Ok(()) => {
            println!("{}", style("API Key set successfully!").green().bold());
            Ok(())
        }
        Err(_) => {
            let message = controller
                .last_error()
                .unwrap_or("Request failed.")
                .to_string();
            anyhow::bail!(message)
        }
    }
}

/// Show configuration information
fn run_status(loader: &ConfigLoader, config: &Config) {
    println!("{}", style("doc-insight status").bold().cyan());
    println!();
    println!("{}", style("Configuration:").bold());
    println!("  Config directory: {}", loader.config_dir().display());
    println!("  Backend URL: {}", config.backend.base_url);
    println!("  Key name: {}", config.backend.key_name);
    println!("  Request timeout: {}s", config.backend.timeout_s);
}
