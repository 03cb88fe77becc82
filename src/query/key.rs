use serde::{Deserialize, Serialize};

use crate::entity::{NoteTag, TagFilter};

/// Inputs that fully determine one cached list result.
///
/// Equality and hashing are structural over every field, so two keys built
/// from the same inputs always address the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryKey {
    pub search: String,
    pub page: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<NoteTag>,
}

impl QueryKey {
    pub fn new(search: impl Into<String>, page: u32, page_size: u32, tag: TagFilter) -> Self {
        Self {
            search: search.into(),
            page: page.max(1),
            page_size,
            tag: tag.as_tag(),
        }
    }

    /// First page, no search, no tag.
    pub fn first_page(page_size: u32) -> Self {
        Self::new("", 1, page_size, TagFilter::All)
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "notes[search={:?} page={} per_page={} tag={}]",
            self.search,
            self.page,
            self.page_size,
            TagFilter::from(self.tag)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_structural_equality() {
        let a = QueryKey::new("abc", 2, 12, TagFilter::Tag(NoteTag::Work));
        let b = QueryKey {
            tag: Some(NoteTag::Work),
            page_size: 12,
            page: 2,
            search: "abc".to_string(),
        };
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_all_filter_maps_to_no_tag() {
        let key = QueryKey::new("", 1, 12, TagFilter::All);
        assert_eq!(key.tag, None);
        assert_eq!(key, QueryKey::first_page(12));
    }

    #[test]
    fn test_page_zero_is_raised_to_one() {
        assert_eq!(QueryKey::new("", 0, 12, TagFilter::All).page, 1);
    }
}
