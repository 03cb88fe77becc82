use percent_encoding::percent_decode_str;
use url::{form_urlencoded, Url};

use crate::entity::TagFilter;
use crate::error::{NotehubError, Result};
use crate::query::QueryKey;

const FILTER_PREFIX: &str = "/notes/filter";
const CREATE_PATH: &str = "/notes/action/create";

/// Which logical view a path names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Notes { filter: TagFilter },
    CreateNote,
    NotePreview { id: String },
}

/// Shareable "where the user is": path plus list query parameters.
///
/// `page` and `search` only carry meaning on list routes and are reset to
/// their defaults elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NavigationLocation {
    pub route: Route,
    pub page: u32,
    pub search: String,
}

impl NavigationLocation {
    pub fn notes(filter: TagFilter, page: u32, search: impl Into<String>) -> Self {
        Self {
            route: Route::Notes { filter },
            page: page.max(1),
            search: search.into(),
        }
    }

    /// `/notes/filter/All`
    pub fn all_notes() -> Self {
        Self::notes(TagFilter::All, 1, "")
    }

    pub fn create() -> Self {
        Self {
            route: Route::CreateNote,
            page: 1,
            search: String::new(),
        }
    }

    pub fn preview(id: impl Into<String>) -> Self {
        Self {
            route: Route::NotePreview { id: id.into() },
            page: 1,
            search: String::new(),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self.route, Route::Notes { .. })
    }

    pub fn filter(&self) -> Option<TagFilter> {
        match self.route {
            Route::Notes { filter } => Some(filter),
            _ => None,
        }
    }

    /// Key for the list this location shows, or `None` off the list route.
    pub fn query_key(&self, page_size: u32) -> Option<QueryKey> {
        self.filter()
            .map(|filter| QueryKey::new(self.search.clone(), self.page, page_size, filter))
    }

    /// Parse a path with optional query string, e.g. `/notes/filter/Work?page=2`.
    pub fn parse(input: &str) -> Result<Self> {
        let base = Url::parse("http://notehub.local/")
            .map_err(|e| NotehubError::InvalidLocation(e.to_string()))?;
        let url = base
            .join(input.trim())
            .map_err(|e| NotehubError::InvalidLocation(format!("{}: {}", input, e)))?;

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        let route = match segments.as_slice() {
            ["notes"] => Route::Notes {
                filter: TagFilter::All,
            },
            ["notes", "filter", rest @ ..] => Route::Notes {
                filter: TagFilter::from_segment(rest.first().copied()),
            },
            ["notes", "action", "create"] => Route::CreateNote,
            ["notes", id] if *id != "filter" && *id != "action" => Route::NotePreview {
                id: percent_decode_str(id)
                    .decode_utf8()
                    .map_err(|e| NotehubError::InvalidLocation(format!("{}: {}", input, e)))?
                    .into_owned(),
            },
            _ => return Err(NotehubError::InvalidLocation(input.to_string())),
        };

        if !matches!(route, Route::Notes { .. }) {
            return Ok(Self {
                route,
                page: 1,
                search: String::new(),
            });
        }

        let mut page = 1;
        let mut search = String::new();
        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                "page" => page = value.trim().parse::<u32>().unwrap_or(1).max(1),
                "search" => search = value.into_owned(),
                _ => {}
            }
        }

        Ok(Self {
            route,
            page,
            search,
        })
    }
}

impl std::fmt::Display for NavigationLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.route {
            Route::CreateNote => f.write_str(CREATE_PATH),
            Route::NotePreview { id } => {
                let encoded: String = form_urlencoded::byte_serialize(id.as_bytes())
                    .collect::<String>()
                    .replace('+', "%20");
                write!(f, "/notes/{}", encoded)
            }
            Route::Notes { filter } => {
                write!(f, "{}/{}", FILTER_PREFIX, filter)?;
                let mut query = form_urlencoded::Serializer::new(String::new());
                if self.page > 1 {
                    query.append_pair("page", &self.page.to_string());
                }
                if !self.search.is_empty() {
                    query.append_pair("search", &self.search);
                }
                let query = query.finish();
                if !query.is_empty() {
                    write!(f, "?{}", query)?;
                }
                Ok(())
            }
        }
    }
}

impl std::str::FromStr for NavigationLocation {
    type Err = NotehubError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
