use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use super::cache::{Begin, Outcome, QueryCache};
use super::hydration::{DehydratedNote, DehydratedNotes, DehydratedState};
use super::{QueryKey, QueryResult};
use crate::api::NotesApi;
use crate::entity::{NewNote, Note, NotesPage};
use crate::error::ApiError;
use crate::util::lock;

type Shared<K, V> = Arc<Mutex<QueryCache<K, V>>>;
/// Entries kept per query family before inactive ones are evicted.
pub const MAX_CACHED_QUERIES: usize = 100;

type BoxFetch<V> = Pin<Box<dyn Future<Output = Result<V, ApiError>> + Send + 'static>>;

/// Cached, deduplicated access to the Notes API.
///
/// Two query families are kept: `notes` (list pages keyed by [`QueryKey`])
/// and `note` (single notes keyed by id). Clones share the same caches.
pub struct QueryClient<A: NotesApi> {
    api: Arc<A>,
    notes: Shared<QueryKey, NotesPage>,
    note: Shared<String, Note>,
}

impl<A: NotesApi> Clone for QueryClient<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            notes: Arc::clone(&self.notes),
            note: Arc::clone(&self.note),
        }
    }
}

/// A started or satisfied request.
enum Started<V> {
    Ready(V),
    Waiting {
        fetch_id: u64,
        rx: watch::Receiver<Outcome<V>>,
    },
}

impl<A: NotesApi> QueryClient<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            notes: Arc::new(Mutex::new(QueryCache::with_capacity(MAX_CACHED_QUERIES))),
            note: Arc::new(Mutex::new(QueryCache::with_capacity(MAX_CACHED_QUERIES))),
        }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    // ========================================================================
    // notes family
    // ========================================================================

    /// Resolve a list page, from cache when fresh.
    pub async fn fetch_notes(&self, key: &QueryKey) -> Result<NotesPage, ApiError> {
        let started = start(&self.notes, key, self.notes_fetcher(key));
        finish(&self.notes, key, started).await
    }

    /// Start fetching `key` in the background if it is not fresh or in flight.
    pub fn ensure_notes(&self, key: &QueryKey) {
        let _ = start(&self.notes, key, self.notes_fetcher(key));
    }

    /// Synchronous cache read for rendering; never touches the network.
    pub fn peek_notes(&self, key: &QueryKey) -> QueryResult<NotesPage> {
        lock(&self.notes).peek(key)
    }

    /// Fetch and cache `key`, logging instead of returning failures.
    pub async fn prefetch_notes(&self, key: &QueryKey) {
        if let Err(e) = self.fetch_notes(key).await {
            tracing::warn!(%key, error = %e, "prefetch failed");
        }
    }

    /// Force a new request for `key`, even if cached data is fresh.
    ///
    /// A request already in flight is awaited first and not reused, so the
    /// result always comes from a request started by this call.
    pub async fn refetch_notes(&self, key: &QueryKey) -> Result<NotesPage, ApiError> {
        let in_flight = lock(&self.notes).is_pending(key);
        if in_flight {
            let _ = self.fetch_notes(key).await;
        }
        lock(&self.notes).invalidate(key);
        self.fetch_notes(key).await
    }

    /// Mark every `notes` entry stale; each refetches on next access.
    pub fn invalidate_notes(&self) {
        let count = lock(&self.notes).invalidate_all();
        tracing::debug!(count, "invalidated notes queries");
    }

    fn notes_fetcher(&self, key: &QueryKey) -> impl FnOnce() -> BoxFetch<NotesPage> {
        let api = Arc::clone(&self.api);
        let key = key.clone();
        move || -> BoxFetch<NotesPage> {
            Box::pin(async move { api.fetch_notes_page(&key).await })
        }
    }

    // ========================================================================
    // note family
    // ========================================================================

    pub async fn fetch_note(&self, id: &str) -> Result<Note, ApiError> {
        let key = id.to_string();
        let started = start(&self.note, &key, self.note_fetcher(&key));
        finish(&self.note, &key, started).await
    }

    pub fn ensure_note(&self, id: &str) {
        let key = id.to_string();
        let _ = start(&self.note, &key, self.note_fetcher(&key));
    }

    pub fn peek_note(&self, id: &str) -> QueryResult<Note> {
        lock(&self.note).peek(&id.to_string())
    }

    pub async fn prefetch_note(&self, id: &str) {
        if let Err(e) = self.fetch_note(id).await {
            tracing::warn!(id, error = %e, "prefetch failed");
        }
    }

    fn note_fetcher(&self, id: &str) -> impl FnOnce() -> BoxFetch<Note> {
        let api = Arc::clone(&self.api);
        let id = id.to_string();
        move || -> BoxFetch<Note> {
            Box::pin(async move { api.fetch_note_by_id(&id).await })
        }
    }

    // ========================================================================
    // mutations
    // ========================================================================

    /// Create a note, then mark the whole `notes` family stale.
    ///
    /// The created note is also seeded into the `note` family so an immediate
    /// preview needs no request.
    pub async fn create_note(&self, input: &NewNote) -> Result<Note, ApiError> {
        let note = self.api.create_note(input).await?;
        tracing::debug!(id = %note.id, "note created");
        self.invalidate_notes();
        lock(&self.note).seed(note.id.clone(), note.clone());
        Ok(note)
    }

    // ========================================================================
    // hydration
    // ========================================================================

    /// Seed fresh entries from a server-side snapshot.
    pub fn hydrate(&self, state: DehydratedState) {
        let (pages, notes) = (state.notes.len(), state.note.len());
        {
            let mut cache = lock(&self.notes);
            for entry in state.notes {
                cache.seed(entry.key, entry.data);
            }
        }
        {
            let mut cache = lock(&self.note);
            for entry in state.note {
                cache.seed(entry.id, entry.data);
            }
        }
        tracing::debug!(pages, notes, "hydrated query cache");
    }

    /// Seed a single list page.
    pub fn seed_notes(&self, key: QueryKey, data: NotesPage) {
        lock(&self.notes).seed(key, data);
    }

    /// Export every fresh entry.
    pub fn dehydrate(&self) -> DehydratedState {
        let notes = lock(&self.notes)
            .fresh_entries()
            .into_iter()
            .map(|(key, data)| DehydratedNotes { key, data })
            .collect();
        let note = lock(&self.note)
            .fresh_entries()
            .into_iter()
            .map(|(id, data)| DehydratedNote { id, data })
            .collect();
        DehydratedState { notes, note }.sorted()
    }
}

/// Consult the cache; on a miss register the fetch and run it on its own task.
///
/// The fetch runs detached from the caller, so a caller that stops waiting
/// (for example because the view moved to another key) does not cancel it and
/// its result still lands in the cache.
fn start<K, V, F, Fut>(cache: &Shared<K, V>, key: &K, fetch: F) -> Started<V>
where
    K: Eq + Hash + Clone + Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
{
    let begin = lock(cache).begin(key);
    match begin {
        Begin::Hit(data) => {
            tracing::debug!(%key, "cache hit");
            Started::Ready(data)
        }
        Begin::Join { fetch_id, rx } => {
            tracing::debug!(%key, fetch_id, "joining in-flight request");
            Started::Waiting { fetch_id, rx }
        }
        Begin::Fetch { fetch_id, tx, rx } => {
            tracing::debug!(%key, fetch_id, "fetching");
            let request = fetch();
            let cache = Arc::clone(cache);
            let key = key.clone();
            tokio::spawn(async move {
                let result = request.await;
                lock(&cache).complete(&key, fetch_id, result.clone());
                let _ = tx.send(Some(result));
            });
            Started::Waiting { fetch_id, rx }
        }
    }
}

async fn finish<K, V>(cache: &Shared<K, V>, key: &K, started: Started<V>) -> Result<V, ApiError>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    let (fetch_id, mut rx) = match started {
        Started::Ready(data) => return Ok(data),
        Started::Waiting { fetch_id, rx } => (fetch_id, rx),
    };

    let outcome = match rx.wait_for(Option::is_some).await {
        Ok(outcome) => outcome.clone(),
        Err(_) => None,
    };
    match outcome {
        Some(result) => result,
        None => {
            lock(cache).abandon(key, fetch_id);
            Err(ApiError::network("Request ended without a result"))
        }
    }
}
