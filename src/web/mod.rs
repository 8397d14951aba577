//! HTTP front end: a few HTML pages and a form-based JSON API.

mod pages;

use crate::{
    config::Config,
    developers::generate_sample_developers,
    filters::{CustomPattern, FilterError},
    search::{AttributeFilters, SearchEngine, SearchError, SearchType},
};
use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        FromRequest, Path, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::{signal, sync::RwLock};

#[derive(Clone)]
struct SharedState {
    engine: Arc<RwLock<SearchEngine>>,
    config: Arc<Config>,
}

pub fn router(engine: Arc<RwLock<SearchEngine>>, config: Arc<Config>) -> Router {
    let shared_state = SharedState { engine, config };

    Router::new()
        .route("/", get(index_page))
        .route("/search", get(search_page))
        .route("/filter", get(filter_page))
        .route("/stats", get(stats_page))
        .route("/profile/:id", get(profile_page))
        .route("/api/search", post(api_search))
        .route("/api/filter", post(api_filter))
        .route("/api/init-data", post(api_init_data))
        .route("/api/patterns", post(api_patterns))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state)
}

async fn start_app(engine: Arc<RwLock<SearchEngine>>, config: Arc<Config>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.web.host, config.web.port);
    let app = router(engine, config);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::warn!("ctrl+c received, shutting down"),
        _ = terminate => log::warn!("SIGTERM received, shutting down"),
    }
}

/// Serve until Ctrl+C or SIGTERM.
pub fn start_daemon(engine: SearchEngine, config: Config) -> anyhow::Result<()> {
    // held out here so the engine (and its blocking http client) is dropped
    // outside the runtime
    let engine = Arc::new(RwLock::new(engine));
    let config = Arc::new(config);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(start_app(engine.clone(), config))
}

/// Every API failure becomes `{"success": false, "error": ...}`.
#[derive(Debug)]
enum ApiError {
    Search(SearchError),
    /// The request body could not be decoded.
    Rejected(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Search(
                err @ (SearchError::InvalidSearchType(_) | SearchError::Filter(_)),
            ) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Search(err) => {
                log::error!("{err:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Rejected(message) => {
                log::warn!("rejected request: {message}");
                (StatusCode::BAD_REQUEST, message)
            }
        };

        (
            status,
            Json(json!({"success": false, "error": message})),
        )
            .into_response()
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        ApiError::Search(err)
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        ApiError::Search(err.into())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::Rejected(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected(rejection.body_text())
    }
}

/// `Form` whose rejection is reported like any other API failure.
#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(ApiError))]
struct ApiForm<T>(T);

/// `Json` whose rejection is reported like any other API failure.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
struct ApiJson<T>(T);

async fn index_page() -> Html<String> {
    Html(pages::index())
}

async fn search_page() -> Html<String> {
    Html(pages::search())
}

async fn filter_page() -> Html<String> {
    Html(pages::filter())
}

async fn stats_page(State(state): State<SharedState>) -> impl IntoResponse {
    let engine = state.engine.clone();

    tokio::task::block_in_place(move || {
        let engine = engine.blocking_read();
        match engine.get_stats() {
            Ok(stats) => (StatusCode::OK, Html(pages::stats(&stats))),
            Err(err) => {
                log::error!("stats failed: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(pages::error(&format!("오류가 발생했습니다: {err}"))),
                )
            }
        }
    })
}

async fn profile_page(
    State(state): State<SharedState>,
    Path(developer_id): Path<String>,
) -> impl IntoResponse {
    let engine = state.engine.clone();

    tokio::task::block_in_place(move || {
        let engine = engine.blocking_read();
        match engine.get_developer_by_id(&developer_id) {
            Ok(Some(developer)) => (StatusCode::OK, Html(pages::profile(&developer))),
            Ok(None) => (
                StatusCode::NOT_FOUND,
                Html(pages::error("개발자를 찾을 수 없습니다.")),
            ),
            Err(err) => {
                log::error!("profile {developer_id} failed: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(pages::error(&format!("오류가 발생했습니다: {err}"))),
                )
            }
        }
    })
}

fn default_search_type() -> String {
    SearchType::default().as_str().to_string()
}

fn default_filter_mode() -> String {
    crate::filters::DEFAULT_PROFILE.to_string()
}

#[derive(Debug, Deserialize)]
struct SearchForm {
    query: String,
    #[serde(default = "default_search_type")]
    search_type: String,
    #[serde(default = "default_filter_mode")]
    filter_mode: String,
    limit: Option<usize>,
}

async fn api_search(
    State(state): State<SharedState>,
    ApiForm(form): ApiForm<SearchForm>,
) -> Result<Json<Value>, ApiError> {
    log::debug!("payload: {form:?}");

    let engine = state.engine.clone();
    let config = state.config.clone();

    tokio::task::block_in_place(move || {
        let search_type: SearchType = form.search_type.parse()?;
        let limit = form.limit.unwrap_or(config.search.default_limit);

        let engine = engine.blocking_read();
        let filters = engine.filter_engine_for(&form.filter_mode, &config.filter_profiles);
        let results = engine.search_with(&filters, &form.query, search_type, limit)?;

        Ok(Json(json!({
            "success": true,
            "results": results.candidates,
            "query": form.query,
            "extracted_filters": results.filters,
            "filter_info": filters.describe(&results.filters),
            "filter_mode": filters.profile().name,
        })))
    })
}

#[derive(Debug, Deserialize)]
struct FilterForm {
    seniority: Option<String>,
    primary_role: Option<String>,
    availability: Option<String>,
    location: Option<String>,
    limit: Option<usize>,
}

async fn api_filter(
    State(state): State<SharedState>,
    ApiForm(form): ApiForm<FilterForm>,
) -> Result<Json<Value>, ApiError> {
    log::debug!("payload: {form:?}");

    let engine = state.engine.clone();
    let limit = form.limit.unwrap_or(state.config.search.default_limit);
    let attributes = AttributeFilters {
        seniority: form.seniority,
        primary_role: form.primary_role,
        availability: form.availability,
        location: form.location,
        min_years_experience: None,
    }
    .normalized();

    tokio::task::block_in_place(move || {
        let engine = engine.blocking_read();
        let results = engine.search_by_filters(&attributes, limit)?;

        Ok(Json(json!({
            "success": true,
            "results": results,
            "filters": attributes,
        })))
    })
}

async fn api_init_data(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let engine = state.engine.clone();
    let count = state.config.search.sample_count;

    tokio::task::block_in_place(move || {
        let engine = engine.blocking_write();
        let developers = generate_sample_developers(count, &mut rand::rng());
        let added = engine.add_developers(&developers)?;
        let stats = engine.get_stats()?;

        Ok(Json(json!({
            "success": true,
            "message": format!("{added}명의 개발자 데이터가 추가되었습니다."),
            "stats": stats,
        })))
    })
}

async fn api_patterns(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<CustomPattern>,
) -> Result<Json<Value>, ApiError> {
    log::debug!("payload: {payload:?}");

    let engine = state.engine.clone();

    tokio::task::block_in_place(move || {
        let mut engine = engine.blocking_write();
        let filter_engine = engine.filter_engine_mut();
        filter_engine.add_custom_pattern(payload.category, &payload.pattern, &payload.value)?;

        let triggers = filter_engine.patterns().trigger_count(payload.category);
        Ok::<_, FilterError>(Json(json!({
            "success": true,
            "category": payload.category,
            "pattern": payload.pattern,
            "value": payload.value,
            "triggers": triggers,
        })))
    })
    .map_err(ApiError::from)
}
