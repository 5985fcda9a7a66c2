//! Filtered projection of the collection for interactive search

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use crate::collection::MediaCollection;
use crate::models::{MediaItem, MediaStatus};

/// Status predicate of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(MediaStatus),
}

impl StatusFilter {
    pub fn matches(self, status: MediaStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => write!(f, "{}", status),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse().map(StatusFilter::Only)
    }
}

/// Ordering of the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Collection order
    #[default]
    Server,
    /// Title, case-insensitive, A to Z
    Title,
    /// Most recent upload first; undated videos last
    Newest,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(SortKey::Server),
            "title" => Ok(SortKey::Title),
            "newest" => Ok(SortKey::Newest),
            other => Err(format!("Unknown sort key: {}", other)),
        }
    }
}

/// Transient search state of one view
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryState {
    pub search_text: String,
    pub status_filter: StatusFilter,
    pub sort: SortKey,
}

impl QueryState {
    fn matches(&self, needle: Option<&str>, item: &MediaItem) -> bool {
        if !self.status_filter.matches(item.status) {
            return false;
        }
        match needle {
            None => true,
            Some(needle) => {
                item.title.to_lowercase().contains(needle)
                    || item.description.to_lowercase().contains(needle)
            }
        }
    }
}

/// Ordered videos satisfying a query
pub type ViewResult<'a> = Vec<&'a MediaItem>;

/// Videos of `collection` matching `query`
///
/// Text matches are case-insensitive substrings of the title or the
/// description; a status filter other than `all` must also match. Sorting is
/// stable, so ties keep collection order.
pub fn derive<'a>(collection: &'a MediaCollection, query: &QueryState) -> ViewResult<'a> {
    let needle = query.search_text.trim().to_lowercase();
    let needle = (!needle.is_empty()).then_some(needle.as_str());

    let mut visible: ViewResult<'a> = collection
        .iter()
        .filter(|item| query.matches(needle, item))
        .collect();

    match query.sort {
        SortKey::Server => {}
        SortKey::Title => visible.sort_by_cached_key(|item| item.title.to_lowercase()),
        SortKey::Newest => visible.sort_by_key(|item| Reverse(item.created_at)),
    }

    visible
}

/// Query state owned by a view, recomputed against the collection on demand
#[derive(Debug, Clone, Default)]
pub struct QueryView {
    state: QueryState,
}

impl QueryView {
    pub fn new(state: QueryState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.state.search_text = text.into();
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.state.status_filter = filter;
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.state.sort = sort;
    }

    /// Recompute the visible videos
    pub fn derive<'a>(&self, collection: &'a MediaCollection) -> ViewResult<'a> {
        derive(collection, &self.state)
    }
}
