//! CLI entrypoint for kubechat
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Result, bail};
use clap::Parser;
use kubechat_application::{ChatController, ConversationLogger, SessionManager};
use kubechat_infrastructure::{
    BackendClient, ConfigLoader, ConfigOverrides, FileConfig, JsonlConversationLogger,
};
use kubechat_presentation::{ChatRepl, Cli, ReplConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let config = load_config(&cli)?;
    info!("Starting kubechat against {}", config.backend.base_url);

    // === Dependency Injection ===
    let backend = Arc::new(BackendClient::from_config(&config.backend)?);
    let (tx, rx) = mpsc::unbounded_channel();

    let conversation_logger: Option<Arc<dyn ConversationLogger>> = config
        .logging
        .conversation_log
        .as_deref()
        .and_then(JsonlConversationLogger::new)
        .map(|logger| {
            info!("Conversation log: {}", logger.path().display());
            Arc::new(logger) as Arc<dyn ConversationLogger>
        });

    let sessions = match &conversation_logger {
        Some(logger) => {
            SessionManager::initialize_with_logger(backend.clone(), tx.clone(), logger.clone())
                .await
        }
        None => SessionManager::initialize(backend.clone(), tx.clone()).await,
    };

    let mut controller = ChatController::new(backend.clone(), Arc::new(Mutex::new(sessions)), tx);
    if let Some(logger) = conversation_logger {
        controller = controller.with_conversation_logger(logger);
    }

    let repl_config = ReplConfig {
        show_status: config.repl.show_status && !cli.quiet,
        history_file: config.repl.history_file.as_deref().map(PathBuf::from),
    };

    let mut repl = ChatRepl::new(controller, rx, repl_config)
        .with_backend_label(backend.base_url().to_string());
    repl.run().await?;

    Ok(())
}

/// Merge every configuration source and check the result.
fn load_config(cli: &Cli) -> Result<FileConfig> {
    let overrides = ConfigOverrides {
        base_url: cli.base_url.clone(),
        user_id: cli.user_id.clone(),
    };

    let config = if cli.no_config {
        ConfigLoader::load_defaults(&overrides)
    } else {
        match ConfigLoader::load(cli.config.as_ref(), &overrides) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config: {}", e);
                bail!("Invalid configuration: {}", e);
            }
        }
    };

    if let Err(errors) = config.validate() {
        let details: Vec<String> = errors.iter().map(|e| format!("  - {}", e)).collect();
        bail!("Invalid configuration:\n{}", details.join("\n"));
    }

    Ok(config)
}
