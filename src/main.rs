use anyhow::{Context, Result, anyhow};
use clap::Parser;
use issue_tracker::cli::Cli;
use issue_tracker::config::{self, ServerConfig};
use issue_tracker::logging::init_logging;
use issue_tracker::server::{self, AppState};
use issue_tracker::storage::{IssueStore, SqliteStorage};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match config::load_config(&cli.overrides(), cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    if cli.print_config {
        match serde_json::to_string_pretty(&config) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if let Err(e) = init_logging(cli.verbose, cli.quiet, config.log_json) {
        eprintln!("Failed to initialize logging: {e}");
    }

    if let Err(e) = run(config).await {
        error!(error = %format!("{e:#}"), "Server exited with an error");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(config: ServerConfig) -> Result<()> {
    let storage = Arc::new(open_storage(&config)?);
    let store: Arc<dyn IssueStore> = storage.clone();
    let app = server::router(AppState::new(store), config.static_dir.as_deref());

    let listener = tokio::net::TcpListener::bind((config.bind.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.bind, config.port))?;
    let addr = listener.local_addr()?;
    info!(%addr, db = %config.db.display(), "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(server::shutdown_signal())
        .await
        .context("server error")?;

    // The router (and every clone of the store handle) is gone once serve returns.
    let storage = Arc::try_unwrap(storage)
        .map_err(|_| anyhow!("store still in use after shutdown"))?;
    storage.close().context("failed to close database")?;
    info!("Database closed");
    Ok(())
}

fn open_storage(config: &ServerConfig) -> Result<SqliteStorage> {
    let storage = if config.is_memory_db() {
        SqliteStorage::open_memory()
    } else {
        SqliteStorage::open_with_timeout(&config.db, config.lock_timeout_ms)
    };
    storage.with_context(|| format!("failed to open database {}", config.db.display()))
}
