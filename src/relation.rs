use futures::future::join_all;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::notion::NotionService;
use crate::property::first_title;

/// Resolved relation titles for one export invocation.
///
/// Holds the title, or the raw id when resolution failed, so every id is
/// fetched at most once.
#[derive(Debug, Default, Clone)]
pub struct RelationTitleCache {
    titles: HashMap<String, String>,
}

impl RelationTitleCache {
    pub fn get(&self, id: &str) -> Option<&str> {
        self.titles.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

/// Titles of the referenced pages, in input order. Distinct uncached ids are
/// fetched concurrently; failures fall back to the id itself.
pub async fn resolve_titles(
    notion: &dyn NotionService,
    ids: &[String],
    cache: &mut RelationTitleCache,
) -> Vec<String> {
    let mut pending: Vec<&str> = Vec::new();
    for id in ids {
        if cache.get(id).is_none() && !pending.contains(&id.as_str()) {
            pending.push(id);
        }
    }

    let fetched = join_all(pending.iter().map(|id| fetch_title(notion, id))).await;
    for (id, title) in pending.into_iter().zip(fetched) {
        cache.titles.insert(id.to_string(), title);
    }

    ids.iter()
        .map(|id| cache.get(id).unwrap_or(id).to_string())
        .collect()
}

pub async fn resolve_joined(
    notion: &dyn NotionService,
    ids: &[String],
    cache: &mut RelationTitleCache,
) -> String {
    resolve_titles(notion, ids, cache).await.join(", ")
}

async fn fetch_title(notion: &dyn NotionService, id: &str) -> String {
    match notion.retrieve_page(id).await {
        Ok(page) => {
            let title = first_title(&page.properties);
            if title.is_empty() {
                debug!(id, "related page has no title; using id");
                id.to_string()
            } else {
                title
            }
        }
        Err(err) => {
            warn!(id, %err, "failed to resolve relation title; using id");
            id.to_string()
        }
    }
}
