// Supermarket Sales Dashboard - Web Server
// JSON API over the filter-aggregate pipeline

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use supermarket_dashboard::{
    build_report, filter, load_config, logging, Dataset, Dimension, FilterOptions,
    FilterSelection, Page,
};

/// Shared application state. The dataset is read-only, so no lock is needed.
#[derive(Clone)]
struct AppState {
    dataset: Arc<Dataset>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Serialize)]
struct PageInfo {
    id: &'static str,
    title: &'static str,
    question: &'static str,
}

#[derive(Serialize)]
struct RecordsResponse<T> {
    count: usize,
    records: T,
}

/// Build a selection from repeated query keys (`branch`, `city`, `customer_type`, `gender`).
/// An absent key keeps every value; a key present with an empty value adds nothing.
fn parse_selection(dataset: &Dataset, pairs: &[(String, String)]) -> FilterSelection {
    let mut selection = FilterSelection::all(dataset);
    let mut given: HashSet<Dimension> = HashSet::new();

    for (key, value) in pairs {
        let dimension = match key.as_str() {
            "branch" => Dimension::Branch,
            "city" => Dimension::City,
            "customer_type" => Dimension::CustomerType,
            "gender" => Dimension::Gender,
            _ => continue,
        };

        if let Some(set) = selection.set_mut(dimension) {
            if given.insert(dimension) {
                set.clear();
            }
            if !value.is_empty() {
                set.insert(value.clone());
            }
        }
    }

    selection
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(serde_json::json!({
        "status": "OK",
        "records": state.dataset.len(),
        "version": supermarket_dashboard::VERSION,
    })))
}

/// GET /api/options - Sidebar option lists
async fn get_options(State(state): State<AppState>) -> Json<ApiResponse<FilterOptions>> {
    Json(ApiResponse::ok(state.dataset.options().clone()))
}

/// GET /api/pages - Page list
async fn get_pages() -> impl IntoResponse {
    let pages: Vec<PageInfo> = Page::ALL
        .iter()
        .map(|p| PageInfo {
            id: p.id(),
            title: p.title(),
            question: p.question(),
        })
        .collect();
    Json(ApiResponse::ok(pages))
}

/// GET /api/records - Filtered records
async fn get_records(
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    let selection = parse_selection(&state.dataset, &query);
    let records = filter(state.dataset.records(), &selection);

    Json(ApiResponse::ok(RecordsResponse {
        count: records.len(),
        records,
    }))
    .into_response()
}

/// GET /api/pages/:page - Aggregates for one page
async fn get_page(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    let page: Page = match page_id.parse() {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!("Rejected page request: {}", e);
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<()>::error(e.to_string())),
            )
                .into_response();
        }
    };

    let selection = parse_selection(&state.dataset, &query);
    let report = build_report(&state.dataset, &selection, page);
    tracing::info!(page = %page, records = report.record_count, "page report served");

    (StatusCode::OK, Json(ApiResponse::ok(report))).into_response()
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/options", get(get_options))
        .route("/records", get(get_records))
        .route("/pages", get(get_pages))
        .route("/pages/:page", get(get_page))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new("web"))
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = match args.as_slice() {
        [flag, path] if flag == "--config" => Some(std::path::PathBuf::from(path)),
        [] => None,
        _ => anyhow::bail!("Usage: dashboard-server [--config <file>]"),
    };

    let config = load_config(config_path.as_deref())?;
    logging::initialize(&config.logging.level, config.log_file().as_deref(), true)?;
    tracing::info!(source = %config.source, "configuration loaded");

    let dataset_path = config.dataset_path();
    let dataset = Dataset::load(&dataset_path)
        .with_context(|| format!("Failed to load dataset {}", dataset_path.display()))?;

    let state = AppState {
        dataset: Arc::new(dataset),
    };

    let addr = config.server.addr.as_str();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server running on http://{}", addr);
    tracing::info!("   API: http://{}/api/pages/overview", addr);

    axum::serve(listener, app(state))
        .await
        .context("Server error")?;

    Ok(())
}
