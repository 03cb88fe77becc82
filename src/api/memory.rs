use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use super::{validate_new_note, NotesApi};
use crate::entity::{NewNote, Note, NoteTag, NotesPage};
use crate::error::ApiError;
use crate::query::QueryKey;
use crate::util::lock;

/// Number of calls observed per operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub list: usize,
    pub get: usize,
    pub create: usize,
}

/// In-process Notes API with the remote service's filtering and paging rules.
///
/// Every call is counted before anything else happens, so tests can assert on
/// how many requests reached "the network".
#[derive(Debug, Default)]
pub struct MemoryNotesApi {
    notes: Mutex<Vec<Note>>,
    latency: Mutex<Option<Duration>>,
    failure: Mutex<Option<ApiError>>,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
    create_calls: AtomicUsize,
}

impl MemoryNotesApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notes(notes: Vec<Note>) -> Self {
        Self {
            notes: Mutex::new(notes),
            ..Self::default()
        }
    }

    /// Delay every call by `latency` (uses the tokio clock).
    pub fn set_latency(&self, latency: Option<Duration>) {
        *lock(&self.latency) = latency;
    }

    /// Make every call fail with `failure` until cleared.
    pub fn set_failure(&self, failure: Option<ApiError>) {
        *lock(&self.failure) = failure;
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            list: self.list_calls.load(Ordering::SeqCst),
            get: self.get_calls.load(Ordering::SeqCst),
            create: self.create_calls.load(Ordering::SeqCst),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.notes).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn simulate_network(&self) -> Result<(), ApiError> {
        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match lock(&self.failure).clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn query_page(&self, query: &QueryKey) -> NotesPage {
        let needle = query.search.to_lowercase();
        let mut matches: Vec<Note> = lock(&self.notes)
            .iter()
            .filter(|n| query.tag.map_or(true, |tag| n.tag == tag))
            .filter(|n| {
                needle.is_empty()
                    || n.title.to_lowercase().contains(&needle)
                    || n.content.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let per_page = query.page_size.max(1) as usize;
        let total_pages = matches.len().div_ceil(per_page).max(1) as u32;
        let start = (query.page.max(1) as usize - 1) * per_page;
        let notes = matches.into_iter().skip(start).take(per_page).collect();

        NotesPage::new(notes, total_pages)
    }
}

impl NotesApi for MemoryNotesApi {
    async fn fetch_notes_page(&self, query: &QueryKey) -> Result<NotesPage, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_network().await?;
        Ok(self.query_page(query))
    }

    async fn fetch_note_by_id(&self, id: &str) -> Result<Note, ApiError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_network().await?;
        lock(&self.notes)
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(id))
    }

    async fn create_note(&self, input: &NewNote) -> Result<Note, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_network().await?;
        validate_new_note(input)?;

        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4().to_string(),
            title: input.title.trim().to_string(),
            content: input.content.trim().to_string(),
            tag: input.tag,
            created_at: now,
            updated_at: Some(now),
        };
        lock(&self.notes).push(note.clone());
        Ok(note)
    }
}

/// Deterministic sample notes cycling through every tag, newest first by index.
pub fn demo_notes(count: usize) -> Vec<Note> {
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).single().unwrap_or_else(Utc::now);
    (0..count)
        .map(|i| {
            let tag = NoteTag::ALL[i % NoteTag::ALL.len()];
            Note {
                id: format!("note-{}", i + 1),
                title: format!("{} note {}", tag, i + 1),
                content: format!("Sample content for {} note number {}.", tag, i + 1),
                tag,
                created_at: base + chrono::Duration::minutes(i as i64),
                updated_at: None,
            }
        })
        .collect()
}
