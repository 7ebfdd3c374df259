use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use notion_lessons_csv::config;
use notion_lessons_csv::notion::{NotionClient, NotionService};
use notion_lessons_csv::query::{QueryPlan, PAGE_SIZE};

#[derive(Parser, Debug)]
#[command(about = "Print a database schema and the query the export would send")]
struct Args {
    /// Path to YAML config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database ID to inspect; defaults to the configured one
    #[arg(long)]
    database_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    config::load_dotenv()?;
    let args = Args::parse();

    let cfg = config::load(args.config.as_deref())?;
    let database_id = args
        .database_id
        .unwrap_or_else(|| cfg.notion.database_id.clone());
    if database_id.trim().is_empty() {
        anyhow::bail!("no database id given and NOTION_DATABASE_ID is not set");
    }
    let client = NotionClient::from_settings(&cfg.notion)?;

    let db = client.retrieve_database(&database_id).await?;
    println!("Database ID: {}", db.id);
    println!("Title: {}", db.plain_title());
    println!("Properties:");
    for (name, prop) in &db.properties {
        println!("  {} -> {{ id: {}, type: {} }}", name, prop.id, prop.kind);
    }

    let export = &cfg.export;
    match QueryPlan::from_schema(&db, &export.status_property, &export.status_value) {
        Ok(plan) => {
            println!("Query (page_size {}):", PAGE_SIZE);
            println!("{}", serde_json::to_string_pretty(&plan.page_request(None))?);
        }
        Err(err) => println!("Query: not possible ({})", err),
    }
    Ok(())
}
