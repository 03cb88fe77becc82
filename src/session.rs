//! One client session: the pieces a notes page wires together.
//!
//! A session owns the query client, the draft store, the view reconciler and
//! the list observer for whichever list is mounted. Each user action goes
//! through here so the rendered view, the location and the active query stay
//! in step.

use std::time::Duration;

use tokio::time::Instant;

use crate::api::{validate_new_note, NotesApi};
use crate::config::Config;
use crate::draft::{DraftPatch, DraftStore};
use crate::entity::{Note, NotesPage, TagFilter};
use crate::error::ApiError;
use crate::query::{DehydratedState, NotesQuery, QueryClient, QueryResult};
use crate::view::{CloseReason, NavigationLocation, Rendered, Screen, Surface, ViewReconciler};

pub struct NotesSession<A: NotesApi> {
    client: QueryClient<A>,
    drafts: DraftStore,
    view: ViewReconciler,
    list: Option<NotesQuery<A>>,
    page_size: u32,
    debounce: Duration,
}

impl<A: NotesApi> NotesSession<A> {
    /// Start at `location` as a direct load, after seeding any server snapshot.
    pub fn boot(
        client: QueryClient<A>,
        drafts: DraftStore,
        config: &Config,
        location: NavigationLocation,
        snapshot: Option<DehydratedState>,
    ) -> Self {
        if let Some(state) = snapshot {
            client.hydrate(state);
        }
        tracing::debug!(%location, "session boot");
        let view = ViewReconciler::new(drafts.clone(), location);
        let mut session = Self {
            client,
            drafts,
            view,
            list: None,
            page_size: config.page_size,
            debounce: config.search_debounce,
        };
        session.reconcile();
        session
    }

    pub fn client(&self) -> &QueryClient<A> {
        &self.client
    }

    pub fn drafts(&self) -> &DraftStore {
        &self.drafts
    }

    pub fn view(&self) -> &ViewReconciler {
        &self.view
    }

    pub fn location(&self) -> &NavigationLocation {
        self.view.location()
    }

    pub fn rendered(&self) -> Rendered {
        self.view.rendered()
    }

    /// Observer for the mounted list, if one is on screen.
    pub fn list_query(&self) -> Option<&NotesQuery<A>> {
        self.list.as_ref()
    }

    // ========================================================================
    // navigation
    // ========================================================================

    pub fn navigate(&mut self, location: NavigationLocation) {
        self.view.navigate(location);
        self.reconcile();
    }

    pub fn back(&mut self) -> bool {
        let moved = self.view.back();
        self.reconcile();
        moved
    }

    pub fn open_create(&mut self) {
        self.view.open_create();
        self.reconcile();
    }

    pub fn open_preview(&mut self, id: impl Into<String>) {
        self.view.open_preview(id);
        self.reconcile();
    }

    /// Close the create form with the Cancel button; the draft is kept.
    pub fn cancel_create(&mut self) -> bool {
        let closed = self.view.close(CloseReason::Cancel);
        self.reconcile();
        closed
    }

    /// Close whatever surface is open via backdrop, Escape or the close icon.
    pub fn dismiss_overlay(&mut self) -> bool {
        let closed = self.view.close(CloseReason::Dismiss);
        self.reconcile();
        closed
    }

    // ========================================================================
    // draft
    // ========================================================================

    pub fn update_draft(&self, patch: DraftPatch) {
        self.drafts.set_draft_field(patch);
    }

    /// Validate and create the drafted note.
    ///
    /// An invalid draft is rejected before any request. On failure the form
    /// stays open with the draft intact; on success the draft is cleared, the
    /// list family is invalidated and the form closes.
    pub async fn submit_draft(&mut self) -> Result<Note, ApiError> {
        let input = self.drafts.get_draft().to_new_note();
        validate_new_note(&input)?;

        let note = self.client.create_note(&input).await?;
        self.drafts.clear_draft();
        self.view.close(CloseReason::Submitted);
        self.reconcile();
        // the list under the form is now stale; refresh it while it is shown
        if let Some(list) = &self.list {
            list.sync();
        }
        Ok(note)
    }

    // ========================================================================
    // list controls
    // ========================================================================

    /// Record a keystroke in the search box.
    pub fn set_search(&mut self, text: impl Into<String>, now: Instant) {
        if let Some(list) = self.list.as_mut() {
            list.set_search(text, now);
        }
    }

    /// Commit a due search and mirror it into the location.
    pub fn advance(&mut self, now: Instant) -> bool {
        let Some(list) = self.list.as_mut() else {
            return false;
        };
        if !list.advance(now) {
            return false;
        }
        let search = list.search().to_string();
        self.view.set_search(search);
        true
    }

    /// Sleep until the pending search is due, then commit it.
    pub async fn wait_for_search(&mut self) -> bool {
        let Some(deadline) = self.list.as_ref().and_then(|l| l.search_deadline()) else {
            return false;
        };
        tokio::time::sleep_until(deadline).await;
        self.advance(Instant::now())
    }

    pub fn set_page(&mut self, page: u32) {
        if let Some(list) = self.list.as_mut() {
            if list.set_page(page) {
                self.view.set_page(list.page());
            }
        }
    }

    /// Switch to another tag's list. This is a new location with page 1 and
    /// no search, so the observer is rebuilt from it.
    pub fn set_tag(&mut self, tag: TagFilter) {
        if self.list.is_none() {
            return;
        }
        self.view.set_filter(tag);
        self.reconcile();
    }

    // ========================================================================
    // results
    // ========================================================================

    /// What the mounted list renders, or `None` when no list is on screen.
    pub fn list_result(&self) -> Option<QueryResult<NotesPage>> {
        self.list.as_ref().map(|l| l.result())
    }

    /// What the open preview renders, or `None` when no preview is open.
    pub fn preview_result(&self) -> Option<QueryResult<Note>> {
        self.preview_id().map(|id| self.client.peek_note(id))
    }

    /// Wait for the mounted list and open preview to resolve.
    pub async fn settle(&self) {
        if let Some(list) = &self.list {
            list.settle().await;
        }
        if let Some(id) = self.preview_id() {
            let _ = self.client.fetch_note(id).await;
        }
    }

    fn preview_id(&self) -> Option<&str> {
        let surface = match self.view.screen() {
            Screen::Overlay { surface, .. } | Screen::FullPage { surface, .. } => surface,
            Screen::List { .. } => return None,
        };
        match surface {
            Surface::Preview { id } => Some(id.as_str()),
            Surface::Create => None,
        }
    }

    /// Bring the list observer and preview query in line with the view.
    fn reconcile(&mut self) {
        match self.view.mounted_list().cloned() {
            None => self.list = None,
            Some(location) => {
                let wanted = location.query_key(self.page_size);
                let current = self.list.as_ref().map(|l| l.key());
                if wanted != current {
                    let filter = location.filter().unwrap_or_default();
                    let list = NotesQuery::new(
                        self.client.clone(),
                        location.search.clone(),
                        location.page,
                        filter,
                        self.page_size,
                        self.debounce,
                    );
                    list.sync();
                    self.list = Some(list);
                }
            }
        }
        if let Some(id) = self.preview_id() {
            self.client.ensure_note(id);
        }
    }
}
