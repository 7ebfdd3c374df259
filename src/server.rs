use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::config::Config;
use crate::csv_writer::CONTENT_TYPE;
use crate::error::ExportError;
use crate::export::run_export;
use crate::notion::retry::RetryPolicy;
use crate::notion::NotionService;

pub const DOWNLOAD_PATH: &str = "/api/notion-csv";
pub const IMPORT_PATH: &str = "/api/notion-csv-wpai.csv";

const NO_CACHE: &str = "no-store, no-cache, must-revalidate, max-age=0";
const ATTACHMENT: &str = "attachment; filename=\"lessons.csv\"";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub notion: Arc<dyn NotionService>,
    pub retry: RetryPolicy,
}

/// Which response header set an endpoint uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvFlavor {
    /// Browser download: `Content-Disposition: attachment`.
    Download,
    /// Import tool: no disposition, connection closed after the response.
    Import,
}

impl CsvFlavor {
    pub fn headers(self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
        match self {
            CsvFlavor::Download => {
                headers.insert(
                    header::CONTENT_DISPOSITION,
                    HeaderValue::from_static(ATTACHMENT),
                );
            }
            CsvFlavor::Import => {
                headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
            }
        }
        headers
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    pub key: Option<String>,
}

#[derive(Debug)]
pub enum AppError {
    Unauthorized,
    Export(ExportError),
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        AppError::Export(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
            AppError::Export(err) => {
                if err.is_configuration() {
                    warn!(%err, "export rejected by configuration");
                } else {
                    error!(%err, "export failed");
                }
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", err)).into_response()
            }
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route(DOWNLOAD_PATH, get(download_csv).head(download_head))
        .route(IMPORT_PATH, get(import_csv).head(import_head))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn download_head() -> Response {
    head_response(CsvFlavor::Download)
}

async fn import_head() -> Response {
    head_response(CsvFlavor::Import)
}

async fn download_csv(State(state): State<AppState>, Query(params): Query<ExportParams>) -> Response {
    serve_export(&state, params, CsvFlavor::Download).await
}

async fn import_csv(State(state): State<AppState>, Query(params): Query<ExportParams>) -> Response {
    serve_export(&state, params, CsvFlavor::Import).await
}

fn head_response(flavor: CsvFlavor) -> Response {
    (StatusCode::OK, flavor.headers()).into_response()
}

async fn serve_export(state: &AppState, params: ExportParams, flavor: CsvFlavor) -> Response {
    let mut response = match export_response(state, params, flavor).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    };
    if flavor == CsvFlavor::Import {
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
    }
    response
}

async fn export_response(
    state: &AppState,
    params: ExportParams,
    flavor: CsvFlavor,
) -> Result<Response, AppError> {
    if !state.config.export.key_matches(params.key.as_deref()) {
        return Err(AppError::Unauthorized);
    }

    let output = run_export(state.notion.as_ref(), &state.config, &state.retry).await?;

    let mut headers = flavor.headers();
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(output.csv.len()));
    Ok((StatusCode::OK, headers, output.csv).into_response())
}
