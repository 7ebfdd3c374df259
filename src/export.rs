use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::csv_writer;
use crate::error::ExportError;
use crate::notion::model::PropertyKind;
use crate::notion::retry::RetryPolicy;
use crate::notion::NotionService;
use crate::paginator::Paginator;
use crate::query::QueryPlan;
use crate::relation::RelationTitleCache;
use crate::row::{OutputRow, RowAssembler, COURSE, HEADERS};

/// Result of one export invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutput {
    pub rows: Vec<OutputRow>,
    pub csv: Vec<u8>,
}

/// Runs the whole export: schema, query plan, pagination, row assembly and
/// CSV rendering. Credentials are checked before any Notion call.
#[instrument(skip_all)]
pub async fn run_export(
    notion: &dyn NotionService,
    config: &Config,
    retry: &RetryPolicy,
) -> Result<ExportOutput, ExportError> {
    config.validate_credentials()?;
    let settings = &config.export;
    let database_id = config.notion.database_id.as_str();
    info!(database_id, "export started");

    let schema = notion
        .retrieve_database(database_id)
        .await
        .map_err(ExportError::Schema)?;
    let plan = QueryPlan::from_schema(&schema, &settings.status_property, &settings.status_value)?;

    let pages = Paginator::new(notion, retry, database_id)
        .fetch_all(&plan)
        .await?;

    let expand_relations =
        settings.expand_relations && schema.kind_of(COURSE) == Some(&PropertyKind::Relation);
    let assembler = RowAssembler::new(notion, &settings.status_property, expand_relations);
    let mut cache = RelationTitleCache::default();
    let mut rows = Vec::with_capacity(pages.len());
    for page in &pages {
        rows.push(assembler.assemble(page, &mut cache).await);
    }

    if !cache.is_empty() {
        debug!(resolved = cache.len(), "relation titles resolved");
    }

    let csv = csv_writer::serialize(&rows, &HEADERS, &settings.csv_options());
    info!(
        pages = pages.len(),
        rows = rows.len(),
        bytes = csv.len(),
        "export finished"
    );
    Ok(ExportOutput { rows, csv })
}
