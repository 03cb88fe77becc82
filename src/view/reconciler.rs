use serde::Serialize;

use super::location::{NavigationLocation, Route};
use crate::draft::DraftStore;
use crate::entity::TagFilter;

/// A sub-view that can render as an overlay or as a full page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Surface {
    Create,
    Preview { id: String },
}

impl Surface {
    fn from_route(route: &Route) -> Option<Self> {
        match route {
            Route::Notes { .. } => None,
            Route::CreateNote => Some(Surface::Create),
            Route::NotePreview { id } => Some(Surface::Preview { id: id.clone() }),
        }
    }
}

/// Why a surface is being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Cancel button: the draft is kept for later.
    Cancel,
    /// Backdrop click, Escape or close icon: the draft is dropped.
    Dismiss,
    /// The note was created: the draft is dropped.
    Submitted,
}

/// What is on screen.
///
/// The overlay variant remembers the list it was opened from, which is the
/// information a bare location string cannot carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    List {
        location: NavigationLocation,
    },
    Overlay {
        list: NavigationLocation,
        surface: Surface,
        location: NavigationLocation,
    },
    FullPage {
        surface: Surface,
        location: NavigationLocation,
    },
}

impl Screen {
    pub fn location(&self) -> &NavigationLocation {
        match self {
            Screen::List { location }
            | Screen::Overlay { location, .. }
            | Screen::FullPage { location, .. } => location,
        }
    }

    /// The list location mounted on screen, if any.
    pub fn mounted_list(&self) -> Option<&NavigationLocation> {
        match self {
            Screen::List { location } => Some(location),
            Screen::Overlay { list, .. } => Some(list),
            Screen::FullPage { .. } => None,
        }
    }

    /// Render from a direct load (first visit, reload or external link).
    fn direct(location: NavigationLocation) -> Self {
        match Surface::from_route(&location.route) {
            None => Screen::List { location },
            Some(surface) => Screen::FullPage { surface, location },
        }
    }

    /// Render `location` reached by in-app navigation from `self`.
    fn in_app(&self, location: NavigationLocation) -> Self {
        let Some(surface) = Surface::from_route(&location.route) else {
            return Screen::List { location };
        };
        match self.mounted_list() {
            Some(list) => Screen::Overlay {
                list: list.clone(),
                surface,
                location,
            },
            None => Screen::FullPage { surface, location },
        }
    }
}

/// Flattened view of [`Screen`] for rendering and assertions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub list: Option<String>,
    pub overlay: Option<Surface>,
    pub full_page: Option<Surface>,
}

/// Tracks navigation history and decides how each location renders.
#[derive(Debug)]
pub struct ViewReconciler {
    drafts: DraftStore,
    screen: Screen,
    history: Vec<NavigationLocation>,
    last_list: Option<NavigationLocation>,
}

impl ViewReconciler {
    /// Start a session at `location` as a direct load.
    pub fn new(drafts: DraftStore, location: NavigationLocation) -> Self {
        let mut reconciler = Self {
            drafts,
            screen: Screen::List {
                location: NavigationLocation::all_notes(),
            },
            history: Vec::new(),
            last_list: None,
        };
        reconciler.load(location);
        reconciler
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn location(&self) -> &NavigationLocation {
        self.screen.location()
    }

    pub fn mounted_list(&self) -> Option<&NavigationLocation> {
        self.screen.mounted_list()
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn rendered(&self) -> Rendered {
        let (overlay, full_page) = match &self.screen {
            Screen::List { .. } => (None, None),
            Screen::Overlay { surface, .. } => (Some(surface.clone()), None),
            Screen::FullPage { surface, .. } => (None, Some(surface.clone())),
        };
        Rendered {
            list: self.mounted_list().map(|l| l.to_string()),
            overlay,
            full_page,
        }
    }

    /// Direct load: reload, typed URL or external link. History is dropped.
    pub fn load(&mut self, location: NavigationLocation) {
        tracing::debug!(%location, "direct load");
        self.history.clear();
        self.set_screen(Screen::direct(location));
    }

    /// In-app navigation that pushes a history entry.
    pub fn navigate(&mut self, location: NavigationLocation) {
        if &location == self.location() {
            return;
        }
        tracing::debug!(from = %self.location(), to = %location, "navigate");
        self.history.push(self.location().clone());
        let next = self.screen.in_app(location);
        self.set_screen(next);
    }

    /// In-app navigation that rewrites the current history entry.
    pub fn replace(&mut self, location: NavigationLocation) {
        let next = match &self.screen {
            // the list under an overlay moved; keep the overlay on top
            Screen::Overlay {
                list,
                surface,
                location: current,
            } if location.is_list() => {
                if let Some(entry) = self.history.iter_mut().rev().find(|e| *e == list) {
                    *entry = location.clone();
                }
                Screen::Overlay {
                    list: location,
                    surface: surface.clone(),
                    location: current.clone(),
                }
            }
            _ => self.screen.in_app(location),
        };
        self.set_screen(next);
    }

    /// Step back one history entry. Returns `false` when there is none.
    pub fn back(&mut self) -> bool {
        let Some(previous) = self.history.pop() else {
            return false;
        };
        tracing::debug!(to = %previous, "back");
        let next = self.screen.in_app(previous);
        self.set_screen(next);
        true
    }

    /// Open the create form from the current view.
    pub fn open_create(&mut self) {
        self.navigate(NavigationLocation::create());
    }

    /// Open the preview of note `id` from the current view.
    pub fn open_preview(&mut self, id: impl Into<String>) {
        self.navigate(NavigationLocation::preview(id));
    }

    /// Close the open surface.
    ///
    /// An overlay returns to the list it covered by unwinding history; a full
    /// page navigates to the last known list, or to all notes. Returns
    /// `false` when no surface is open.
    pub fn close(&mut self, reason: CloseReason) -> bool {
        let surface = match &self.screen {
            Screen::List { .. } => return false,
            Screen::Overlay { surface, .. } | Screen::FullPage { surface, .. } => surface.clone(),
        };

        if surface == Surface::Create && reason != CloseReason::Cancel {
            self.drafts.clear_draft();
        }

        match self.screen.clone() {
            Screen::Overlay { list, .. } => {
                while let Some(previous) = self.history.pop() {
                    if previous == list {
                        break;
                    }
                }
                self.set_screen(Screen::List { location: list });
            }
            Screen::FullPage { .. } => {
                let target = self
                    .last_list
                    .clone()
                    .unwrap_or_else(NavigationLocation::all_notes);
                self.navigate(target);
            }
            Screen::List { .. } => {}
        }
        true
    }

    /// Switch tag filter; a new list location with page 1 and no search.
    pub fn set_filter(&mut self, filter: TagFilter) {
        self.navigate(NavigationLocation::notes(filter, 1, ""));
    }

    /// Mirror a page change into the mounted list's location.
    pub fn set_page(&mut self, page: u32) {
        if let Some(list) = self.mounted_list() {
            let mut next = list.clone();
            next.page = page.max(1);
            self.replace(next);
        }
    }

    /// Mirror a committed search into the mounted list's location (page 1).
    pub fn set_search(&mut self, search: impl Into<String>) {
        if let Some(list) = self.mounted_list() {
            let mut next = list.clone();
            next.search = search.into();
            next.page = 1;
            self.replace(next);
        }
    }

    fn set_screen(&mut self, screen: Screen) {
        if let Screen::List { location } = &screen {
            self.last_list = Some(location.clone());
        }
        self.screen = screen;
    }
}
