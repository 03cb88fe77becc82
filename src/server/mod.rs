//! HTTP surface: server-side prefetch of list and preview pages.
//!
//! Every prefetch request builds a fresh [`QueryClient`](crate::query::QueryClient)
//! over the shared upstream API, fills it for the requested location and
//! returns the dehydrated snapshot next to the page props. A browser client
//! hydrates from that snapshot and renders without a second request.
//!
//! With `--demo` the server also exposes the Notes API itself under `/api`,
//! backed by an in-memory store.

mod notes_api;
mod prefetch;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::api::NotesApi;
use crate::error::{ApiError, NotehubError, Result};

pub use notes_api::notes_api_router;
pub use prefetch::{ListProps, Prefetched, PreviewProps};

/// Shared state for the prefetch handlers.
pub struct AppState<A: NotesApi> {
    pub api: Arc<A>,
    pub page_size: u32,
}

impl<A: NotesApi> Clone for AppState<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            page_size: self.page_size,
        }
    }
}

/// Prefetch routes plus `/health`.
pub fn router<A: NotesApi>(api: Arc<A>, page_size: u32) -> Router {
    let state = AppState { api, page_size };
    Router::new()
        .route("/health", get(health))
        .route("/notes", get(prefetch::list::<A>))
        .route("/notes/filter", get(prefetch::list::<A>))
        .route("/notes/filter/{*slug}", get(prefetch::list::<A>))
        .route("/notes/{id}", get(prefetch::preview::<A>))
        .with_state(state)
}

/// Run `app` on `bind` until `shutdown` is cancelled.
pub async fn serve(app: Router, bind: &str, shutdown: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "prefetch server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("prefetch server stopped");
    Ok(())
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// HTTP status for an upstream failure.
pub(crate) fn api_status(err: &ApiError) -> StatusCode {
    match err {
        ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
        ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ApiError::Network { .. } => StatusCode::BAD_GATEWAY,
    }
}

#[derive(Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

impl IntoResponse for NotehubError {
    fn into_response(self) -> Response {
        match self {
            NotehubError::Api(err) => {
                tracing::debug!(error = %err, kind = err.error_type(), "request failed");
                (api_status(&err), Json(err)).into_response()
            }
            NotehubError::InvalidLocation(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    kind: "invalid_location",
                    message,
                }),
            )
                .into_response(),
            other => {
                tracing::warn!(error = %other, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        kind: "internal",
                        message: other.to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}
