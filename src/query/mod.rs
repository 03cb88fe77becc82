//! Query orchestration: cache, request dedup, debounced search and hydration.

mod cache;
mod client;
mod debounce;
mod hydration;
mod key;
mod observer;
mod result;

pub use cache::{EntryState, QueryCache};
pub use client::QueryClient;
pub use debounce::{DebounceState, Debouncer};
pub use hydration::{DehydratedNote, DehydratedNotes, DehydratedState};
pub use key::QueryKey;
pub use observer::NotesQuery;
pub use result::{QueryResult, QueryStatus};
