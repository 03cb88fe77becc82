//! The in-progress note being composed.
//!
//! One [`DraftStore`] exists per client session and is handed to every surface
//! that shows the create form, so text typed into the overlay is still there
//! when the same form is opened as a full page (and the other way round).

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::entity::{NewNote, NoteTag};
use crate::util::lock;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub title: String,
    pub content: String,
    pub tag: NoteTag,
}

impl Draft {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.content.is_empty() && self.tag == NoteTag::default()
    }

    pub fn to_new_note(&self) -> NewNote {
        NewNote {
            title: self.title.clone(),
            content: self.content.clone(),
            tag: self.tag,
        }
    }
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tag: Option<NoteTag>,
}

impl DraftPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn tag(tag: NoteTag) -> Self {
        Self {
            tag: Some(tag),
            ..Self::default()
        }
    }
}

/// Shared handle to the session draft. Clones point at the same draft.
#[derive(Debug, Clone, Default)]
pub struct DraftStore {
    inner: Arc<Mutex<Draft>>,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_draft(&self) -> Draft {
        lock(&self.inner).clone()
    }

    /// Merge `patch` into the draft, last write wins per field.
    pub fn set_draft_field(&self, patch: DraftPatch) {
        let mut draft = lock(&self.inner);
        if let Some(title) = patch.title {
            draft.title = title;
        }
        if let Some(content) = patch.content {
            draft.content = content;
        }
        if let Some(tag) = patch.tag {
            draft.tag = tag;
        }
    }

    pub fn clear_draft(&self) {
        *lock(&self.inner) = Draft::default();
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.inner).is_empty()
    }
}
