//! Notes API client.
//!
//! [`NotesApi`] is the contract the rest of the crate talks to. [`HttpNotesApi`]
//! speaks to the remote service; [`MemoryNotesApi`] implements the same
//! semantics in-process for tests, demos and the prefetch server's demo mode.
//! Neither retries: retry policy belongs to callers.

mod http;
mod memory;

use std::future::Future;

use crate::entity::{NewNote, Note, NotesPage};
use crate::error::ApiError;
use crate::query::QueryKey;

pub use http::HttpNotesApi;
pub use memory::{demo_notes, CallCounts, MemoryNotesApi};

/// Validation limits shared by the create form and the memory API.
pub mod validation {
    pub const MIN_TITLE_LENGTH: usize = 3;
    pub const MAX_TITLE_LENGTH: usize = 50;
    pub const MAX_CONTENT_LENGTH: usize = 500;
}

pub trait NotesApi: Send + Sync + 'static {
    /// `GET /notes?page&perPage&search&tag`
    fn fetch_notes_page(
        &self,
        query: &QueryKey,
    ) -> impl Future<Output = Result<NotesPage, ApiError>> + Send;

    /// `GET /notes/:id`
    fn fetch_note_by_id(&self, id: &str) -> impl Future<Output = Result<Note, ApiError>> + Send;

    /// `POST /notes`
    fn create_note(&self, input: &NewNote) -> impl Future<Output = Result<Note, ApiError>> + Send;
}

/// Check a create request against the service's input rules.
///
/// Lengths are counted in characters of the trimmed value.
pub fn validate_new_note(input: &NewNote) -> Result<(), ApiError> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(ApiError::validation("title", "Title is required"));
    }
    let title_len = title.chars().count();
    if title_len < validation::MIN_TITLE_LENGTH {
        return Err(ApiError::validation(
            "title",
            format!(
                "Title must be at least {} characters",
                validation::MIN_TITLE_LENGTH
            ),
        ));
    }
    if title_len > validation::MAX_TITLE_LENGTH {
        return Err(ApiError::validation(
            "title",
            format!(
                "Title is too long: {} characters (max {})",
                title_len,
                validation::MAX_TITLE_LENGTH
            ),
        ));
    }

    let content_len = input.content.trim().chars().count();
    if content_len > validation::MAX_CONTENT_LENGTH {
        return Err(ApiError::validation(
            "content",
            format!(
                "Content is too long: {} characters (max {})",
                content_len,
                validation::MAX_CONTENT_LENGTH
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::NoteTag;

    fn input(title: &str, content: &str) -> NewNote {
        NewNote {
            title: title.to_string(),
            content: content.to_string(),
            tag: NoteTag::Todo,
        }
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_new_note(&input("Buy milk", "")).is_ok());
        assert!(validate_new_note(&input("abc", &"x".repeat(500))).is_ok());
    }

    #[test]
    fn test_title_required() {
        let err = validate_new_note(&input("   ", "body")).unwrap_err();
        assert_eq!(err, ApiError::validation("title", "Title is required"));
    }

    #[test]
    fn test_title_too_short() {
        let err = validate_new_note(&input("Hi", "")).unwrap_err();
        assert!(matches!(err, ApiError::Validation { ref field, .. } if field == "title"));
        assert!(err.to_string().contains("at least 3"));
    }

    #[test]
    fn test_title_too_long() {
        let err = validate_new_note(&input(&"t".repeat(51), "")).unwrap_err();
        assert!(err.to_string().contains("max 50"));
        assert!(validate_new_note(&input(&"t".repeat(50), "")).is_ok());
    }

    #[test]
    fn test_content_too_long() {
        let err = validate_new_note(&input("Title", &"c".repeat(501))).unwrap_err();
        assert!(matches!(err, ApiError::Validation { ref field, .. } if field == "content"));
    }

    #[test]
    fn test_lengths_count_characters() {
        // three characters, nine bytes
        assert!(validate_new_note(&input("日本語", "")).is_ok());
    }
}
