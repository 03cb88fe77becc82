use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::Uri;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::api::NotesApi;
use crate::entity::TagFilter;
use crate::error::{NotehubError, Result};
use crate::query::{DehydratedState, QueryClient};
use crate::view::NavigationLocation;

/// Page props plus the snapshot to hydrate from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefetched<P> {
    pub props: P,
    pub state: DehydratedState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProps {
    pub initial_page: u32,
    pub initial_search: String,
    pub initial_tag: TagFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewProps {
    pub note_id: String,
}

/// `GET /notes/filter/{*slug}?page&search`
///
/// Upstream failures are logged and yield an empty snapshot; the client then
/// fetches on mount.
pub(super) async fn list<A: NotesApi>(
    State(state): State<AppState<A>>,
    uri: Uri,
) -> Result<Json<Prefetched<ListProps>>> {
    let location = NavigationLocation::parse(&uri.to_string())?;
    let key = location
        .query_key(state.page_size)
        .ok_or_else(|| NotehubError::InvalidLocation(uri.to_string()))?;

    let client = QueryClient::new(Arc::clone(&state.api));
    client.prefetch_notes(&key).await;
    tracing::debug!(%location, "prefetched list");

    Ok(Json(Prefetched {
        props: ListProps {
            initial_page: location.page,
            initial_search: location.search.clone(),
            initial_tag: location.filter().unwrap_or_default(),
        },
        state: client.dehydrate(),
    }))
}

/// `GET /notes/{id}`
pub(super) async fn preview<A: NotesApi>(
    State(state): State<AppState<A>>,
    Path(id): Path<String>,
) -> Result<Json<Prefetched<PreviewProps>>> {
    let client = QueryClient::new(Arc::clone(&state.api));
    client.fetch_note(&id).await?;
    tracing::debug!(id = %id, "prefetched note");

    Ok(Json(Prefetched {
        props: PreviewProps { note_id: id },
        state: client.dehydrate(),
    }))
}
