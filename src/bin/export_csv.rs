use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use notion_lessons_csv::config;
use notion_lessons_csv::export::run_export;
use notion_lessons_csv::notion::NotionClient;

#[derive(Debug, Parser)]
#[command(author, version, about = "Export the lessons database to a CSV file and exit")]
struct Args {
    /// Path to YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file; stdout when omitted
    #[arg(long, short)]
    output: Option<PathBuf>,
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
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(args.config.as_deref())?;
    let notion = NotionClient::from_settings(&cfg.notion)?;
    let retry = cfg.notion.retry_policy();

    let output = run_export(&notion, &cfg, &retry).await?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &output.csv)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), rows = output.rows.len(), "wrote CSV");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&output.csv)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
