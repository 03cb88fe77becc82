//! Server-to-client cache handoff.

use serde::{Deserialize, Serialize};

use super::QueryKey;
use crate::entity::{Note, NotesPage};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DehydratedNotes {
    pub key: QueryKey,
    pub data: NotesPage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DehydratedNote {
    pub id: String,
    pub data: Note,
}

/// Fresh cache entries captured ahead of first render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DehydratedState {
    #[serde(default)]
    pub notes: Vec<DehydratedNotes>,
    #[serde(default)]
    pub note: Vec<DehydratedNote>,
}

impl DehydratedState {
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.note.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Stable ordering so identical caches serialize identically.
    pub(crate) fn sorted(mut self) -> Self {
        self.notes.sort_by_key(|e| e.key.to_string());
        self.note.sort_by(|a, b| a.id.cmp(&b.id));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::demo_notes;
    use crate::entity::{NoteTag, TagFilter};

    #[test]
    fn test_json_round_trip_is_exact() {
        let notes = demo_notes(3);
        let state = DehydratedState {
            notes: vec![DehydratedNotes {
                key: QueryKey::new("sample", 1, 12, TagFilter::Tag(NoteTag::Work)),
                data: NotesPage::new(notes.clone(), 4),
            }],
            note: vec![DehydratedNote {
                id: notes[0].id.clone(),
                data: notes[0].clone(),
            }],
        };

        let json = state.to_json().unwrap();
        assert_eq!(DehydratedState::from_json(&json).unwrap(), state);
    }

    #[test]
    fn test_missing_families_default_to_empty() {
        let state = DehydratedState::from_json("{}").unwrap();
        assert!(state.is_empty());
    }
}
