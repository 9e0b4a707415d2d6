//! HTTP surface for the mock API (axum).
//!
//! Routes:
//! - `POST /api/data` with a JSON body `{ "limit": n, "skip": n }`
//! - `GET /api/data?limit=n&skip=n`
//! - `GET /api/initial` for the first page
//! - `GET /health`

use std::future::Future;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::api::mock::MockApi;
use crate::api::page::{PageRequest, initial_page};
use crate::error::{FeedError, Result};

pub const DEFAULT_ADDR: &str = "127.0.0.1:5173";

/// Shared state for the router
#[derive(Debug, Clone)]
pub struct AppState {
    pub api: MockApi,
}

/// Error wrapper that renders as `{ "error": "..." }` with a matching status
#[derive(Debug)]
pub struct ApiError(pub FeedError);

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Builds the router for the mock API.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/data", get(get_data).post(post_data))
        .route("/api/initial", get(get_initial))
        .route("/health", get(health))
        .with_state(state)
}

async fn post_data(State(state): State<Arc<AppState>>, body: Bytes) -> std::result::Result<Response, ApiError> {
    let request: PageRequest = serde_json::from_slice(&body).map_err(|e| {
        log::warn!("Rejecting malformed page request body: {}", e);
        FeedError::from(e)
    })?;
    serve_page(&state, request).await
}

async fn get_data(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<PageRequest>, QueryRejection>,
) -> std::result::Result<Response, ApiError> {
    let Query(request) = query.map_err(|e| FeedError::InvalidRequest(e.body_text()))?;
    serve_page(&state, request).await
}

async fn serve_page(state: &AppState, request: PageRequest) -> std::result::Result<Response, ApiError> {
    let page = state.api.fetch(request).await?;
    Ok(Json(page).into_response())
}

async fn get_initial() -> Response {
    Json(initial_page()).into_response()
}

async fn health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

/// Serve on an existing listener until `shutdown` resolves. Tests bind to
/// 127.0.0.1:0 and pass the listener in.
pub async fn run_serve_on_listener<F>(listener: TcpListener, api: MockApi, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    log::info!(
        "Mock API listening on http://{} (delay={:?}, failure_rate={})",
        addr,
        api.config().delay,
        api.config().failure_rate
    );

    let app = router(Arc::new(AppState { api }));
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    log::info!("Mock API on {} shut down", addr);
    Ok(())
}

/// Serve on an ephemeral 127.0.0.1 port from a background task.
///
/// Returns the base URL and a sender that stops the server. Dropping the
/// sender stops it too.
pub async fn spawn_local(api: MockApi) -> Result<(String, oneshot::Sender<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let url = format!("http://{}", listener.local_addr()?);
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let shutdown = async move {
            let _ = rx.await;
        };
        if let Err(e) = run_serve_on_listener(listener, api, shutdown).await {
            log::error!("Local mock API failed: {}", e);
        }
    });
    Ok((url, tx))
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn run_serve(addr: &str, api: MockApi) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    run_serve_on_listener(listener, api, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}
