use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use notion_lessons_csv::config;
use notion_lessons_csv::notion::NotionClient;
use notion_lessons_csv::server::{build_app, AppState, DOWNLOAD_PATH, IMPORT_PATH};

#[derive(Debug, Parser)]
#[command(author, version, about = "Serve the Notion lessons database as CSV")]
struct Args {
    /// Path to YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, overrides server.bind and BIND_ADDR
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    config::load_dotenv()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(args.config.as_deref())?;
    if let Err(err) = cfg.validate_credentials() {
        warn!(%err, "credentials incomplete; exports will fail until configured");
    }

    let addr = match args.bind {
        Some(addr) => addr,
        None => cfg
            .server
            .bind
            .parse()
            .with_context(|| format!("invalid bind address {:?}", cfg.server.bind))?,
    };

    let notion = NotionClient::from_settings(&cfg.notion)?;
    let state = AppState {
        retry: cfg.notion.retry_policy(),
        notion: Arc::new(notion),
        config: Arc::new(cfg),
    };

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, download = DOWNLOAD_PATH, import = IMPORT_PATH, "serving lessons CSV");

    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(?err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
