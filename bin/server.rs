// Common Charges - Web Server

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use common_charges::api::{router, AppState};
use common_charges::{SqliteStore, DEFAULT_DATABASE};

/// Common charges HTTP API
#[derive(Parser, Debug)]
#[command(name = "charges-server", version, about = "Common charges HTTP API")]
struct Cli {
    /// SQLite database file (created if missing)
    #[arg(long, env = "COMMON_CHARGES_DB", default_value = DEFAULT_DATABASE)]
    database: PathBuf,

    /// Listen address
    #[arg(long, env = "COMMON_CHARGES_LISTEN", default_value = "0.0.0.0:3000")]
    listen: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let store = SqliteStore::open(&cli.database)
        .with_context(|| format!("Failed to open database {}", cli.database.display()))?;
    info!("Database opened: {}", cli.database.display());

    let app = router(AppState::new(store));

    let listener = tokio::net::TcpListener::bind(&cli.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", cli.listen))?;
    info!("Server running on http://{}", cli.listen);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
