use thiserror::Error;

use crate::config::ConfigError;
use crate::notion::NotionError;

/// Failures that abort an export. No CSV is produced when one occurs.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("property \"{0}\" is not a status, select or checkbox property in the database")]
    UnsupportedStatusProperty(String),
    #[error("failed to retrieve database schema: {0}")]
    Schema(#[source] NotionError),
    #[error("failed to query database: {0}")]
    Query(#[source] NotionError),
    #[error("query page {page} reported more results without a next cursor")]
    MissingCursor { page: usize },
}

impl ExportError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ExportError::Config(_) | ExportError::UnsupportedStatusProperty(_)
        )
    }
}
