use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::api::NotesApi;
use crate::config::DEFAULT_PAGE_SIZE;
use crate::entity::{NewNote, Note, NotesPage, TagFilter};
use crate::error::Result;
use crate::query::QueryKey;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    page: Option<u32>,
    per_page: Option<u32>,
    search: Option<String>,
    tag: Option<String>,
}

impl ListParams {
    fn into_key(self) -> QueryKey {
        QueryKey::new(
            self.search.unwrap_or_default(),
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
            TagFilter::from_segment(self.tag.as_deref()),
        )
    }
}

/// The Notes API wire format served from any [`NotesApi`]:
/// `GET /notes`, `GET /notes/{id}`, `POST /notes`.
pub fn notes_api_router<A: NotesApi>(api: Arc<A>) -> Router {
    Router::new()
        .route("/notes", get(list::<A>).post(create::<A>))
        .route("/notes/{id}", get(show::<A>))
        .with_state(api)
}

async fn list<A: NotesApi>(
    State(api): State<Arc<A>>,
    Query(params): Query<ListParams>,
) -> Result<Json<NotesPage>> {
    let key = params.into_key();
    Ok(Json(api.fetch_notes_page(&key).await?))
}

async fn show<A: NotesApi>(
    State(api): State<Arc<A>>,
    Path(id): Path<String>,
) -> Result<Json<Note>> {
    Ok(Json(api.fetch_note_by_id(&id).await?))
}

async fn create<A: NotesApi>(
    State(api): State<Arc<A>>,
    Json(input): Json<NewNote>,
) -> Result<(StatusCode, Json<Note>)> {
    let note = api.create_note(&input).await?;
    tracing::info!(id = %note.id, tag = %note.tag, "note created");
    Ok((StatusCode::CREATED, Json(note)))
}
