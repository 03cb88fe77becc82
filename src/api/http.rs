use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::NotesApi;
use crate::config::Config;
use crate::entity::{NewNote, Note, NotesPage};
use crate::error::{ApiError, NotehubError, Result};
use crate::query::QueryKey;

/// Notes API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpNotesApi {
    client: Client,
    base_url: Url,
}

impl HttpNotesApi {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("notehub/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = Url::parse(config.api_base())
            .map_err(|e| NotehubError::Config(format!("Invalid api_base_url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(NotehubError::Config(format!(
                "api_base_url cannot be used as a base: {}",
                base_url
            )));
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// `{base}/notes` followed by `extra` as percent-encoded path segments.
    fn endpoint(&self, extra: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("notes").extend(extra);
        }
        url
    }
}

/// Query string for a list request; empty search and the `All` filter are omitted.
pub(crate) fn list_params(query: &QueryKey) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("page", query.page.to_string()),
        ("perPage", query.page_size.to_string()),
    ];
    if !query.search.is_empty() {
        params.push(("search", query.search.clone()));
    }
    if let Some(tag) = query.tag {
        params.push(("tag", tag.to_string()));
    }
    params
}

/// Map a response to a decoded body or to the error taxonomy.
async fn decode<T: DeserializeOwned>(
    response: Response,
    not_found_id: Option<&str>,
) -> std::result::Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| ApiError::network(format!("Invalid response body: {}", e)));
    }

    match (status, not_found_id) {
        (StatusCode::NOT_FOUND, Some(id)) => Err(ApiError::not_found(id)),
        (StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY, _) => {
            let body = response.text().await.unwrap_or_default();
            Err(validation_from_body(&body))
        }
        _ => Err(ApiError::network(format!("Unexpected status {}", status))),
    }
}

/// Pull `field`/`message` out of an error body when the server provides them.
fn validation_from_body(body: &str) -> ApiError {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let field = parsed
        .as_ref()
        .and_then(|v| v.get("field"))
        .and_then(|v| v.as_str())
        .unwrap_or("request")
        .to_string();
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(|v| v.as_str())
        .map(String::from)
        .unwrap_or_else(|| {
            if body.is_empty() {
                "Rejected by server".to_string()
            } else {
                body.to_string()
            }
        });
    ApiError::Validation { field, message }
}

impl NotesApi for HttpNotesApi {
    async fn fetch_notes_page(&self, query: &QueryKey) -> std::result::Result<NotesPage, ApiError> {
        tracing::debug!(%query, "GET /notes");
        let response = self
            .client
            .get(self.endpoint(&[]))
            .query(&list_params(query))
            .send()
            .await?;
        let page: NotesPage = decode(response, None).await?;
        Ok(NotesPage::new(page.notes, page.total_pages))
    }

    async fn fetch_note_by_id(&self, id: &str) -> std::result::Result<Note, ApiError> {
        tracing::debug!(id, "GET /notes/:id");
        let response = self.client.get(self.endpoint(&[id])).send().await?;
        decode(response, Some(id)).await
    }

    async fn create_note(&self, input: &NewNote) -> std::result::Result<Note, ApiError> {
        tracing::debug!(title = %input.title, tag = %input.tag, "POST /notes");
        let response = self
            .client
            .post(self.endpoint(&[]))
            .json(input)
            .send()
            .await?;
        decode(response, None).await
    }
}
