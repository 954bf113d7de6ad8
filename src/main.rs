use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use url::Url;

use crankd::coach::HttpCoachBackend;
use crankd::config::ClientConfig;
use crankd::linker::History;
use crankd::orchestrator::Orchestrator;
use crankd::store::FileStore;

/// Terminal client for the Crank'd cycling coach.
#[derive(Parser, Debug)]
#[command(name = "crankd", version, about, long_about = None)]
struct Cli {
    /// Location to start at, e.g. the URL Strava sent you back to
    #[arg(long)]
    location: Option<Url>,

    /// Path of the local store file (overrides CRANKD_STORE_PATH)
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Chat with the coach (default)
    Chat,
    /// Check that the coach backend is running
    Status,
    /// Print the Strava authorization link for the saved user ID
    Link,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(store) = cli.store {
        config.store_path = store;
    }
    let location = cli.location.unwrap_or_else(|| config.app_url.clone());

    tracing::debug!(
        backend = %config.backend_url,
        store = %config.store_path.display(),
        "Configuration loaded"
    );

    let store = Arc::new(FileStore::new(&config.store_path));
    let backend = Arc::new(HttpCoachBackend::new(&config)?);
    let mut orchestrator =
        Orchestrator::start(&config, store, backend, Box::new(History::new(location))).await;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => crankd::repl::run(orchestrator).await?,
        Commands::Status => {
            let status = orchestrator.health().await?;
            println!("Coach backend at {}: {status}", config.backend_url);
        }
        Commands::Link => {
            let url = orchestrator.begin_linking()?;
            println!("{url}");
        }
    }

    Ok(())
}
