// src/entity/note.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category a note is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NoteTag {
    #[default]
    Todo,
    Work,
    Personal,
    Meeting,
    Shopping,
}

impl NoteTag {
    /// Every tag in the order the create form offers them.
    pub const ALL: [NoteTag; 5] = [
        NoteTag::Todo,
        NoteTag::Work,
        NoteTag::Personal,
        NoteTag::Meeting,
        NoteTag::Shopping,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteTag::Todo => "Todo",
            NoteTag::Work => "Work",
            NoteTag::Personal => "Personal",
            NoteTag::Meeting => "Meeting",
            NoteTag::Shopping => "Shopping",
        }
    }
}

impl std::fmt::Display for NoteTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NoteTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Todo" => Ok(NoteTag::Todo),
            "Work" => Ok(NoteTag::Work),
            "Personal" => Ok(NoteTag::Personal),
            "Meeting" => Ok(NoteTag::Meeting),
            "Shopping" => Ok(NoteTag::Shopping),
            _ => Err(format!("Invalid note tag: {}", s)),
        }
    }
}

/// Tag filter for the list view. `All` never appears on a stored note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TagFilter {
    #[default]
    All,
    Tag(NoteTag),
}

impl TagFilter {
    /// The tag to send to the API; `All` means no filter.
    pub fn as_tag(&self) -> Option<NoteTag> {
        match self {
            TagFilter::All => None,
            TagFilter::Tag(tag) => Some(*tag),
        }
    }

    /// Lenient parse used for route segments: anything unknown is `All`.
    pub fn from_segment(segment: Option<&str>) -> Self {
        segment
            .and_then(|s| s.parse().ok())
            .unwrap_or(TagFilter::All)
    }
}

impl From<Option<NoteTag>> for TagFilter {
    fn from(tag: Option<NoteTag>) -> Self {
        tag.map(TagFilter::Tag).unwrap_or(TagFilter::All)
    }
}

impl std::fmt::Display for TagFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagFilter::All => f.write_str("All"),
            TagFilter::Tag(tag) => write!(f, "{}", tag),
        }
    }
}

impl std::str::FromStr for TagFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "All" {
            return Ok(TagFilter::All);
        }
        s.parse().map(TagFilter::Tag)
    }
}

impl Serialize for TagFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TagFilter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub tag: NoteTag,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One page of a filtered note listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesPage {
    pub notes: Vec<Note>,
    pub total_pages: u32,
}

impl NotesPage {
    pub fn new(notes: Vec<Note>, total_pages: u32) -> Self {
        Self {
            notes,
            total_pages: total_pages.max(1),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 1)
    }
}

/// Input for creating a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub tag: NoteTag,
}
