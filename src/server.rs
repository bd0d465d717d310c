//! HTTP server for visitors and the knowledge base admin.
//!
//! Visitors chat and inspect retrieval freely. Every `/admin/*` route
//! requires the admin password in the `x-admin-password` header.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `GET`    | `/knowledge/stats` | Total items and per-category counts |
//! | `POST`   | `/retrieve` | Run the relevance engine, return diagnostics |
//! | `POST`   | `/chat` | Answer a question grounded in the knowledge base |
//! | `POST`   | `/chat/stream` | Same, as server-sent events (`delta`, `done`, `error`) |
//! | `GET`    | `/admin/knowledge` | List every item with its index |
//! | `POST`   | `/admin/knowledge` | Chunk and append text under a category |
//! | `DELETE` | `/admin/knowledge` | Clear the knowledge base |
//! | `DELETE` | `/admin/knowledge/{index}` | Remove one item |
//! | `DELETE` | `/admin/knowledge/category/{category}` | Remove a whole category |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `unauthorized` (401),
//! `admin_disabled` (403), `not_found` (404), `internal` (500),
//! `llm_error` (502).
//!
//! `/chat/stream` rejects a blank message with a plain 400. Once the stream
//! has started, a failure arrives as an `error` event carrying the same
//! `{ "code", "message" }` pair.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use brand_chat_core::models::KnowledgeItem;
use brand_chat_core::search::{RelevanceEngine, Retrieval};
use brand_chat_core::store::CorpusStore;
use brand_chat_core::Error as CoreError;

use crate::admin::{check_password, AdminAccess};
use crate::chat::{self, ChatAnswer};
use crate::config::Config;
use crate::ingest::ingest_text;
use crate::json_store::JsonFileStore;
use crate::stats::{compute_stats, KnowledgeStats};

/// Header carrying the admin password.
pub const ADMIN_HEADER: &str = "x-admin-password";

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    engine: Arc<RelevanceEngine>,
    store: Arc<dyn CorpusStore>,
    admin_password: Option<Arc<str>>,
}

impl AppState {
    /// Build state from config, reading the admin password from the
    /// environment once.
    pub fn new(config: Config, store: Arc<dyn CorpusStore>) -> Self {
        let admin_password = config.admin.password().map(Arc::from);
        Self {
            engine: Arc::new(config.engine()),
            config: Arc::new(config),
            store,
            admin_password,
        }
    }

    /// Override the admin password (tests and embedding).
    pub fn with_admin_password(mut self, password: Option<&str>) -> Self {
        self.admin_password = password.map(Arc::from);
        self
    }

    fn require_admin(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let supplied = headers.get(ADMIN_HEADER).and_then(|v| v.to_str().ok());
        match check_password(self.admin_password.as_deref(), supplied) {
            AdminAccess::Granted => Ok(()),
            AdminAccess::Denied => {
                tracing::warn!("rejected admin request: bad password");
                Err(AppError::new(
                    StatusCode::UNAUTHORIZED,
                    "unauthorized",
                    "incorrect admin password",
                ))
            }
            AdminAccess::NotConfigured => Err(AppError::new(
                StatusCode::FORBIDDEN,
                "admin_disabled",
                "no admin password is configured on this server",
            )),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/knowledge/stats", get(handle_stats))
        .route("/retrieve", post(handle_retrieve))
        .route("/chat", post(handle_chat))
        .route("/chat/stream", post(handle_chat_stream))
        .route(
            "/admin/knowledge",
            get(handle_list).post(handle_ingest).delete(handle_clear),
        )
        .route("/admin/knowledge/{index}", delete(handle_remove_at))
        .route(
            "/admin/knowledge/category/{category}",
            delete(handle_remove_category),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind`.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let store = JsonFileStore::from_config(config).await?;
    let items = store.snapshot().await?.len();
    let state = AppState::new(config.clone(), Arc::new(store));

    if state.admin_password.is_none() {
        tracing::warn!(
            env = %config.admin.password_env,
            "admin password not set; admin routes are disabled"
        );
    }

    let app = router(state);

    tracing::info!(items, "knowledge base loaded");
    tracing::info!("listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Map an operation error to a response. Validation errors from the core
/// become 400/404; anything else gets `fallback`.
fn classify_error(err: anyhow::Error, fallback: (StatusCode, &str)) -> AppError {
    match err.downcast_ref::<CoreError>() {
        Some(CoreError::IndexOutOfRange { .. }) => {
            AppError::new(StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
        Some(_) => AppError::new(StatusCode::BAD_REQUEST, "bad_request", err.to_string()),
        None => {
            tracing::error!(error = %err, "request failed");
            AppError::new(fallback.0, fallback.1, err.to_string())
        }
    }
}

fn internal(err: anyhow::Error) -> AppError {
    classify_error(err, (StatusCode::INTERNAL_SERVER_ERROR, "internal"))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /knowledge/stats ============

async fn handle_stats(State(state): State<AppState>) -> Result<Json<KnowledgeStats>, AppError> {
    let corpus = state.store.snapshot().await.map_err(internal)?;
    Ok(Json(compute_stats(&corpus)))
}

// ============ POST /retrieve ============

#[derive(Deserialize)]
struct RetrieveRequest {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct RetrieveResponse<'a> {
    count: usize,
    #[serde(flatten)]
    retrieval: Retrieval<'a>,
}

/// Runs the relevance engine and returns the matched categories, the item
/// count, and the selected items. Intended for debug views.
async fn handle_retrieve(
    State(state): State<AppState>,
    Json(req): Json<RetrieveRequest>,
) -> Result<Response, AppError> {
    if req.query.trim().is_empty() {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "bad_request",
            CoreError::EmptyQuery.to_string(),
        ));
    }

    let corpus = state.store.snapshot().await.map_err(internal)?;
    let limit = req.limit.unwrap_or(state.engine.top_k());
    let retrieval = state.engine.retrieve_with_limit(&req.query, &corpus, limit);

    Ok(Json(RetrieveResponse {
        count: retrieval.count(),
        retrieval,
    })
    .into_response())
}

// ============ POST /chat ============

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatAnswer>, AppError> {
    let answer = chat::answer(
        &state.config,
        &state.engine,
        state.store.as_ref(),
        &req.message,
        |_| {},
    )
    .await
    .map_err(|e| classify_error(e, (StatusCode::BAD_GATEWAY, "llm_error")))?;

    Ok(Json(answer))
}

// ============ POST /chat/stream ============

/// Streams reply text as `delta` events while the model generates, then one
/// `done` event with the full [`ChatAnswer`].
async fn handle_chat_stream(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "bad_request",
            CoreError::EmptyQuery.to_string(),
        ));
    }

    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    tokio::spawn(async move {
        let deltas = tx.clone();
        let result = chat::answer(
            &state.config,
            &state.engine,
            state.store.as_ref(),
            &req.message,
            move |text| {
                // Receiver gone means the client hung up; keep generating quietly.
                let _ = deltas.send(Event::default().event("delta").data(text));
            },
        )
        .await;

        let event = match result {
            Ok(answer) => Event::default()
                .event("done")
                .json_data(&answer)
                .unwrap_or_else(|e| error_event("internal", &e.to_string())),
            Err(e) => {
                let err = classify_error(e, (StatusCode::BAD_GATEWAY, "llm_error"));
                error_event(&err.code, &err.message)
            }
        };
        let _ = tx.send(event);
    });

    let stream = UnboundedReceiverStream::new(rx).map(Ok::<_, Infallible>);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn error_event(code: &str, message: &str) -> Event {
    let detail = serde_json::json!({ "code": code, "message": message });
    Event::default().event("error").data(detail.to_string())
}

// ============ /admin/knowledge ============

#[derive(Serialize)]
struct ListedItem<'a> {
    index: usize,
    #[serde(flatten)]
    item: &'a KnowledgeItem,
}

#[derive(Serialize)]
struct ListResponse<'a> {
    total_items: usize,
    items: Vec<ListedItem<'a>>,
}

async fn handle_list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    state.require_admin(&headers)?;
    let corpus = state.store.snapshot().await.map_err(internal)?;
    let items = corpus
        .iter()
        .enumerate()
        .map(|(index, item)| ListedItem { index, item })
        .collect();

    Ok(Json(ListResponse {
        total_items: corpus.len(),
        items,
    })
    .into_response())
}

#[derive(Deserialize)]
struct IngestRequest {
    category: String,
    text: String,
}

#[derive(Serialize)]
struct IngestResponse {
    added: usize,
}

async fn handle_ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<IngestRequest>,
) -> Result<(StatusCode, Json<IngestResponse>), AppError> {
    state.require_admin(&headers)?;
    let added = ingest_text(state.store.as_ref(), &req.category, &req.text)
        .await
        .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(IngestResponse { added })))
}

#[derive(Serialize)]
struct RemovedCount {
    removed: usize,
}

#[derive(Serialize)]
struct RemovedItem {
    removed: KnowledgeItem,
}

async fn handle_clear(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RemovedCount>, AppError> {
    state.require_admin(&headers)?;
    let removed = state.store.clear().await.map_err(internal)?;
    Ok(Json(RemovedCount { removed }))
}

async fn handle_remove_at(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(index): Path<usize>,
) -> Result<Json<RemovedItem>, AppError> {
    state.require_admin(&headers)?;
    let removed = state.store.remove_at(index).await.map_err(internal)?;
    Ok(Json(RemovedItem { removed }))
}

async fn handle_remove_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(category): Path<String>,
) -> Result<Json<RemovedCount>, AppError> {
    state.require_admin(&headers)?;
    let removed = state
        .store
        .remove_by_category(&category)
        .await
        .map_err(internal)?;
    Ok(Json(RemovedCount { removed }))
}
