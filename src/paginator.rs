use tracing::{debug, instrument};

use crate::error::ExportError;
use crate::notion::model::Page;
use crate::notion::retry::RetryPolicy;
use crate::notion::NotionService;
use crate::query::QueryPlan;

/// Sequential cursor pagination over a database query.
pub struct Paginator<'a> {
    notion: &'a dyn NotionService,
    retry: &'a RetryPolicy,
    database_id: &'a str,
}

impl<'a> Paginator<'a> {
    pub fn new(notion: &'a dyn NotionService, retry: &'a RetryPolicy, database_id: &'a str) -> Self {
        Self {
            notion,
            retry,
            database_id,
        }
    }

    /// All matching pages in response order. Each page request runs under the
    /// retry policy; the first unrecoverable failure aborts the whole fetch.
    /// A response with `has_more` but no `next_cursor` is an error, never a
    /// shorter result.
    #[instrument(skip_all, fields(database_id = %self.database_id))]
    pub async fn fetch_all(&self, plan: &QueryPlan) -> Result<Vec<Page>, ExportError> {
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;
        let mut requests = 0_usize;

        loop {
            let request = plan.page_request(cursor.take());
            let response = self
                .retry
                .run("query_database", || {
                    self.notion.query_database(self.database_id, &request)
                })
                .await
                .map_err(ExportError::Query)?;
            requests += 1;
            debug!(
                page = requests,
                results = response.results.len(),
                has_more = response.has_more,
                "fetched query page"
            );
            pages.extend(response.results);

            if !response.has_more {
                break;
            }
            match response.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Err(ExportError::MissingCursor { page: requests }),
            }
        }

        debug!(requests, total = pages.len(), "pagination finished");
        Ok(pages)
    }
}
