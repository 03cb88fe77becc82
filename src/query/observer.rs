use std::time::Duration;

use tokio::time::Instant;

use super::debounce::Debouncer;
use super::{QueryClient, QueryKey, QueryResult};
use crate::api::NotesApi;
use crate::entity::{NotesPage, TagFilter};

/// Live list query for one mounted list view.
///
/// Search text goes through a debouncer; page and tag changes apply at once.
/// Whenever the active key changes the observer asks the client for it, and
/// [`NotesQuery::result`] only ever reads the active key, so a response that
/// arrives for a key the user has already left is cached but never shown.
pub struct NotesQuery<A: NotesApi> {
    client: QueryClient<A>,
    search_input: String,
    search: String,
    debouncer: Debouncer<String>,
    page: u32,
    tag: TagFilter,
    page_size: u32,
}

impl<A: NotesApi> NotesQuery<A> {
    pub fn new(
        client: QueryClient<A>,
        search: impl Into<String>,
        page: u32,
        tag: TagFilter,
        page_size: u32,
        debounce: Duration,
    ) -> Self {
        let search = search.into();
        Self {
            client,
            search_input: search.clone(),
            search,
            debouncer: Debouncer::new(debounce),
            page: page.max(1),
            tag,
            page_size,
        }
    }

    /// Key derived from the committed (debounced) search, page and tag.
    pub fn key(&self) -> QueryKey {
        QueryKey::new(self.search.clone(), self.page, self.page_size, self.tag)
    }

    /// Raw text currently in the search box.
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// Search text the active key was built from.
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn tag(&self) -> TagFilter {
        self.tag
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Request the active key if it is neither fresh nor already in flight.
    pub fn sync(&self) {
        self.client.ensure_notes(&self.key());
    }

    /// Record a keystroke; the fetch waits for the debounce period.
    pub fn set_search(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        self.search_input = text.clone();
        self.debouncer.input(text, now);
    }

    /// When the pending search (if any) is due.
    pub fn search_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Commit the debounced search if its quiet period is over.
    ///
    /// A changed search resets the page to 1 in the same step, so the switch
    /// costs a single request. Returns whether the active key changed.
    pub fn advance(&mut self, now: Instant) -> bool {
        let Some(search) = self.debouncer.poll(now) else {
            return false;
        };
        if search == self.search {
            return false;
        }
        tracing::debug!(search = %search, "search committed");
        self.search = search;
        self.page = 1;
        self.sync();
        true
    }

    /// Sleep until the pending search is due, then commit it.
    pub async fn wait_for_search(&mut self) -> bool {
        let Some(deadline) = self.debouncer.deadline() else {
            return false;
        };
        tokio::time::sleep_until(deadline).await;
        self.advance(Instant::now())
    }

    /// Move to `page` immediately.
    pub fn set_page(&mut self, page: u32) -> bool {
        let page = page.max(1);
        if page == self.page {
            return false;
        }
        self.page = page;
        self.sync();
        true
    }

    /// Switch tag filter immediately, back to page 1.
    pub fn set_tag(&mut self, tag: TagFilter) -> bool {
        if tag == self.tag {
            return false;
        }
        self.tag = tag;
        self.page = 1;
        self.sync();
        true
    }

    /// What the list renders right now.
    pub fn result(&self) -> QueryResult<NotesPage> {
        self.client.peek_notes(&self.key())
    }

    /// Wait for the active key to resolve, then report it.
    pub async fn settle(&self) -> QueryResult<NotesPage> {
        let key = self.key();
        let _ = self.client.fetch_notes(&key).await;
        self.client.peek_notes(&key)
    }

    /// Page count for the pagination control; 1 until data arrives.
    pub fn total_pages(&self) -> u32 {
        self.result().data.map_or(1, |page| page.total_pages)
    }
}
