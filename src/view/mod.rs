//! View state: which location the user is at and how it renders.
//!
//! The same location can render two ways. Reached by in-app navigation from a
//! list, the create form and the note preview open as overlays above that
//! list. Reached directly (reload, pasted link) they render as a full page
//! with no list underneath.

mod location;
mod reconciler;

pub use location::{NavigationLocation, Route};
pub use reconciler::{CloseReason, Rendered, Screen, Surface, ViewReconciler};
