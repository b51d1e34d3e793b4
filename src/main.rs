//! ChatRPC - chat session client for a JSON-RPC backend
//!
#![doc = "ChatRPC - chat session client for a JSON-RPC backend"]
#![doc = "Main entry point for the chatrpc command-line tool."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatrpc::cli::{Cli, Commands};
use chatrpc::commands::{self, Backend};
use chatrpc::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/chatrpc.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let backend = Backend::connect(config)?;

    // Execute command
    match cli.command {
        Commands::Sessions { command } => {
            tracing::debug!("Running sessions command: {:?}", command);
            commands::sessions::handle_sessions(&backend, command).await?;
        }
        Commands::Send { session, text } => {
            tracing::info!("Sending message to session {}", session);
            commands::chat::run_send(&backend, &session, &text).await?;
        }
        Commands::Chat { session } => {
            tracing::info!("Starting interactive chat in session {}", session);
            commands::chat::run_chat(&backend, &session).await?;
        }
        Commands::Providers { command } => {
            tracing::debug!("Running providers command: {:?}", command);
            commands::providers::handle_providers(&backend, command).await?;
        }
        Commands::Servers { command } => {
            tracing::debug!("Running servers command: {:?}", command);
            commands::servers::handle_servers(&backend, command).await?;
        }
    }

    backend.controller.shutdown();
    Ok(())
}

/// Initialize the tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise `chatrpc=info`, or `chatrpc=debug`
/// with `--verbose`.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "chatrpc=debug" } else { "chatrpc=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
