#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

use notion_lessons_csv::config::Config;
use notion_lessons_csv::notion::model::{DatabaseSchema, Page, QueryRequest, QueryResponse};
use notion_lessons_csv::notion::{NotionError, NotionService};

/// Scripted Notion backend. Query responses are served in order; page
/// lookups are answered from a title map, unknown ids fail with 404.
#[derive(Clone)]
pub struct FakeNotion {
    schema: Value,
    query_responses: Arc<Mutex<VecDeque<Result<Value, NotionError>>>>,
    page_titles: Arc<HashMap<String, String>>,
    pub database_calls: Arc<Mutex<usize>>,
    pub query_calls: Arc<Mutex<Vec<QueryRequest>>>,
    pub page_calls: Arc<Mutex<Vec<String>>>,
}

impl FakeNotion {
    pub fn new(schema: Value) -> Self {
        Self {
            schema,
            query_responses: Arc::default(),
            page_titles: Arc::default(),
            database_calls: Arc::default(),
            query_calls: Arc::default(),
            page_calls: Arc::default(),
        }
    }

    pub fn with_query_responses(mut self, responses: Vec<Result<Value, NotionError>>) -> Self {
        self.query_responses = Arc::new(Mutex::new(VecDeque::from(responses)));
        self
    }

    pub fn with_page_titles(mut self, titles: &[(&str, &str)]) -> Self {
        self.page_titles = Arc::new(
            titles
                .iter()
                .map(|(id, title)| (id.to_string(), title.to_string()))
                .collect(),
        );
        self
    }

    pub async fn query_calls(&self) -> Vec<QueryRequest> {
        self.query_calls.lock().await.clone()
    }

    pub async fn page_calls(&self) -> Vec<String> {
        self.page_calls.lock().await.clone()
    }

    pub async fn database_calls(&self) -> usize {
        *self.database_calls.lock().await
    }
}

#[async_trait]
impl NotionService for FakeNotion {
    async fn retrieve_database(&self, _database_id: &str) -> Result<DatabaseSchema, NotionError> {
        *self.database_calls.lock().await += 1;
        Ok(serde_json::from_value(self.schema.clone())?)
    }

    async fn query_database(
        &self,
        _database_id: &str,
        query: &QueryRequest,
    ) -> Result<QueryResponse, NotionError> {
        self.query_calls.lock().await.push(query.clone());
        let next = self
            .query_responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(query_page(vec![], None)));
        Ok(serde_json::from_value(next?)?)
    }

    async fn retrieve_page(&self, page_id: &str) -> Result<Page, NotionError> {
        self.page_calls.lock().await.push(page_id.to_string());
        match self.page_titles.get(page_id) {
            Some(title) => Ok(serde_json::from_value(json!({
                "id": page_id,
                "properties": { "Name": title_prop(title) }
            }))?),
            None => Err(api_error(404)),
        }
    }
}

pub fn api_error(status: u16) -> NotionError {
    NotionError::Api {
        status,
        body: format!("{{\"status\":{}}}", status),
    }
}

pub fn lessons_schema() -> Value {
    json!({
        "id": "db-lessons",
        "title": [{ "plain_text": "Leckék" }],
        "properties": {
            "Lecke címe": { "id": "title", "type": "title" },
            "Kurzus": { "id": "k1", "type": "relation" },
            "Sorszám": { "id": "s1", "type": "number" },
            "Szakasz": { "id": "s2", "type": "select" },
            "Videó státusz": { "id": "v1", "type": "status" },
            "Lecke hossza": { "id": "l1", "type": "rich_text" }
        }
    })
}

pub fn title_prop(text: &str) -> Value {
    json!({ "type": "title", "title": [{ "plain_text": text }] })
}

pub fn rich_text_prop(text: &str) -> Value {
    json!({ "type": "rich_text", "rich_text": [{ "plain_text": text }] })
}

pub fn relation_prop(ids: &[&str]) -> Value {
    let refs: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
    json!({ "type": "relation", "relation": refs })
}

pub fn lesson_page(id: &str, course_ids: &[&str], ordinal: f64, title: &str, length: &str) -> Value {
    json!({
        "id": id,
        "created_time": "2024-03-01T10:00:00.000Z",
        "properties": {
            "Lecke címe": title_prop(title),
            "Kurzus": relation_prop(course_ids),
            "Sorszám": { "type": "number", "number": ordinal },
            "Szakasz": { "type": "select", "select": { "name": "Intro" } },
            "Videó státusz": { "type": "status", "status": { "name": "✅ Kész" } },
            "Lecke hossza": rich_text_prop(length)
        }
    })
}

pub fn query_page(results: Vec<Value>, next_cursor: Option<&str>) -> Value {
    json!({
        "object": "list",
        "results": results,
        "has_more": next_cursor.is_some(),
        "next_cursor": next_cursor
    })
}

pub fn test_config() -> Config {
    let mut cfg = Config::default();
    cfg.notion.token = "secret-token".into();
    cfg.notion.database_id = "db-lessons".into();
    cfg.notion.retry_base_delay_ms = 0;
    cfg.export.expand_relations = true;
    cfg
}
