//! URI pattern matching to operation codes.
//!
//! # Responsibility
//! - Register the fixed address patterns served by the store.
//! - Resolve a parsed `NoteUri` to exactly one `Route`.
//!
//! # Invariants
//! - Patterns are fixed at construction; matching never mutates state.
//! - A literal segment beats the numeric wildcard at the same position.
//! - Foreign authorities never match.

use crate::contract::{PATH_LIVE_FOLDERS, PATH_NOTES, PATH_SEARCH};
use crate::routing::projection::{ProjectionMap, ProjectionSet};
use crate::routing::uri::NoteUri;

/// Operation code resolved from an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// `/notes`
    Collection,
    /// `/notes/{id}`
    Item(i64),
    /// `/notes/search`
    Search,
    /// `/live_folders/notes`
    LiveFolder,
}

impl Route {
    /// Short stable name used in logs and errors.
    pub fn name(self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Item(_) => "item",
            Self::Search => "search",
            Self::LiveFolder => "live_folder",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteKind {
    Collection,
    Item,
    Search,
    LiveFolder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(&'static str),
    /// Run of ASCII digits that fits in `i64`.
    Number,
}

#[derive(Debug, Clone)]
struct Pattern {
    segments: Vec<Segment>,
    kind: RouteKind,
}

impl Pattern {
    fn new(segments: Vec<Segment>, kind: RouteKind) -> Self {
        Self { segments, kind }
    }

    fn matches(&self, path: &[String]) -> Option<Route> {
        if path.len() != self.segments.len() {
            return None;
        }

        let mut id = None;
        for (pattern, actual) in self.segments.iter().zip(path) {
            match pattern {
                Segment::Literal(expected) => {
                    if actual != expected {
                        return None;
                    }
                }
                Segment::Number => id = Some(parse_id_segment(actual)?),
            }
        }

        Some(match self.kind {
            RouteKind::Collection => Route::Collection,
            RouteKind::Item => Route::Item(id?),
            RouteKind::Search => Route::Search,
            RouteKind::LiveFolder => Route::LiveFolder,
        })
    }

    /// Sort key: wildcard positions later in the path win ties.
    fn specificity(&self) -> Vec<bool> {
        self.segments
            .iter()
            .map(|segment| matches!(segment, Segment::Number))
            .collect()
    }
}

/// Immutable routing and projection configuration, built once per store.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    authority: String,
    patterns: Vec<Pattern>,
    projections: ProjectionSet,
}

impl RoutingTable {
    /// Registers the note address patterns under `authority`.
    pub fn new(authority: impl Into<String>) -> Self {
        let patterns = vec![
            Pattern::new(vec![Segment::Literal(PATH_NOTES)], RouteKind::Collection),
            Pattern::new(
                vec![Segment::Literal(PATH_NOTES), Segment::Number],
                RouteKind::Item,
            ),
            Pattern::new(
                vec![Segment::Literal(PATH_LIVE_FOLDERS), Segment::Literal(PATH_NOTES)],
                RouteKind::LiveFolder,
            ),
            Pattern::new(
                vec![Segment::Literal(PATH_NOTES), Segment::Literal(PATH_SEARCH)],
                RouteKind::Search,
            ),
        ];

        Self {
            authority: authority.into(),
            patterns,
            projections: ProjectionSet::new(),
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Resolves `uri` to its route, or `None` when no pattern matches.
    pub fn route(&self, uri: &NoteUri) -> Option<Route> {
        if uri.authority() != self.authority {
            return None;
        }

        self.patterns
            .iter()
            .filter_map(|pattern| {
                pattern
                    .matches(uri.segments())
                    .map(|route| (pattern.specificity(), route))
            })
            .min_by(|left, right| left.0.cmp(&right.0))
            .map(|(_, route)| route)
    }

    /// Projection whitelist for `route`.
    pub fn projection(&self, route: Route) -> &ProjectionMap {
        self.projections.for_route(route)
    }

    /// `content://{authority}/notes`
    pub fn collection_uri(&self) -> NoteUri {
        NoteUri::new(self.authority.as_str(), [PATH_NOTES])
    }

    /// `content://{authority}/notes/{id}`
    pub fn item_uri(&self, id: i64) -> NoteUri {
        self.collection_uri().with_appended_id(id)
    }

    /// `content://{authority}/notes/search`
    pub fn search_uri(&self) -> NoteUri {
        NoteUri::new(self.authority.as_str(), [PATH_NOTES, PATH_SEARCH])
    }

    /// `content://{authority}/live_folders/notes`
    pub fn live_folder_uri(&self) -> NoteUri {
        NoteUri::new(self.authority.as_str(), [PATH_LIVE_FOLDERS, PATH_NOTES])
    }

    /// Canonical address whose changes affect rows read through `route`.
    ///
    /// Search and live-folder rows are views over the collection, so they
    /// depend on `collection_uri()`. Items depend on `item_uri(id)`, which
    /// normalizes spellings like `/notes/007`.
    pub fn dependency_uri(&self, route: Route) -> NoteUri {
        match route {
            Route::Item(id) => self.item_uri(id),
            Route::Collection | Route::Search | Route::LiveFolder => self.collection_uri(),
        }
    }
}

fn parse_id_segment(segment: &str) -> Option<i64> {
    if segment.is_empty() || !segment.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}
