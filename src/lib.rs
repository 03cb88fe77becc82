pub mod api;
pub mod cli;
pub mod config;
pub mod draft;
pub mod entity;
pub mod error;
pub mod query;
pub mod server;
pub mod session;
pub mod util;
pub mod view;

pub use api::{HttpNotesApi, MemoryNotesApi, NotesApi};
pub use config::Config;
pub use draft::{Draft, DraftPatch, DraftStore};
pub use error::{ApiError, NotehubError, Result};
pub use query::{QueryClient, QueryKey, QueryResult, QueryStatus};
pub use session::NotesSession;
pub use view::{NavigationLocation, ViewReconciler};
