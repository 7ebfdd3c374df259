use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::NotionSettings;
use crate::notion::model::{DatabaseSchema, Page, QueryRequest, QueryResponse};

pub mod model;
pub mod retry;

pub const NOTION_API_BASE: &str = "https://api.notion.com/";
pub const NOTION_VERSION: &str = "2022-06-28";

#[derive(Debug, Error)]
pub enum NotionError {
    #[error("invalid Notion URL: {0}")]
    InvalidUrl(String),
    #[error("failed to reach Notion: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("notion error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid Notion response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl NotionError {
    pub fn status(&self) -> Option<u16> {
        match self {
            NotionError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Rate limiting and server errors; everything else is permanent.
    pub fn is_transient(&self) -> bool {
        matches!(self.status(), Some(429) | Some(500..=599))
    }
}

/// Read-only capabilities the export needs from the Notion API.
#[async_trait]
pub trait NotionService: Send + Sync {
    async fn retrieve_database(&self, database_id: &str) -> Result<DatabaseSchema, NotionError>;

    async fn query_database(
        &self,
        database_id: &str,
        query: &QueryRequest,
    ) -> Result<QueryResponse, NotionError>;

    async fn retrieve_page(&self, page_id: &str) -> Result<Page, NotionError>;
}

#[derive(Clone)]
pub struct NotionClient {
    http: Client,
    base_url: Url,
    token: String,
    version: String,
}

impl fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionClient")
            .field("base_url", &self.base_url)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl NotionClient {
    pub fn new(token: String, version: String) -> Result<Self, NotionError> {
        let base_url =
            Url::parse(NOTION_API_BASE).map_err(|e| NotionError::InvalidUrl(e.to_string()))?;
        Self::with_base_url(token, version, base_url)
    }

    pub fn with_base_url(token: String, version: String, base_url: Url) -> Result<Self, NotionError> {
        let http = Client::builder()
            .user_agent(concat!("notion-lessons-csv/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()?;
        Ok(Self {
            http,
            base_url,
            token,
            version,
        })
    }

    pub fn from_settings(settings: &NotionSettings) -> Result<Self, NotionError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| NotionError::InvalidUrl(format!("{}: {}", settings.base_url, e)))?;
        Self::with_base_url(settings.token.clone(), settings.version.clone(), base_url)
    }

    fn endpoint(&self, path: &str) -> Result<Url, NotionError> {
        self.base_url
            .join(path)
            .map_err(|e| NotionError::InvalidUrl(format!("{}: {}", path, e)))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", &self.version)
    }

    pub fn build_query_request(
        &self,
        database_id: &str,
        query: &QueryRequest,
    ) -> Result<reqwest::Request, NotionError> {
        let url = self.endpoint(&format!("v1/databases/{}/query", database_id))?;
        Ok(self
            .authorized(self.http.post(url))
            .header("Content-Type", "application/json")
            .json(query)
            .build()?)
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::Request) -> Result<T, NotionError> {
        debug!(method = %request.method(), url = %request.url(), "sending notion request");
        let res = self.http.execute(request).await?;

        let status = res.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = res.text().await.unwrap_or_default();
            warn!("rate limited by Notion: {}", body);
            return Err(NotionError::Api {
                status: status.as_u16(),
                body,
            });
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "notion API error: {}", body);
            return Err(NotionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = res.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl NotionService for NotionClient {
    async fn retrieve_database(&self, database_id: &str) -> Result<DatabaseSchema, NotionError> {
        let url = self.endpoint(&format!("v1/databases/{}", database_id))?;
        let request = self.authorized(self.http.get(url)).build()?;
        self.execute(request).await
    }

    async fn query_database(
        &self,
        database_id: &str,
        query: &QueryRequest,
    ) -> Result<QueryResponse, NotionError> {
        let request = self.build_query_request(database_id, query)?;
        self.execute(request).await
    }

    async fn retrieve_page(&self, page_id: &str) -> Result<Page, NotionError> {
        let url = self.endpoint(&format!("v1/pages/{}", page_id))?;
        let request = self.authorized(self.http.get(url)).build()?;
        self.execute(request).await
    }
}
