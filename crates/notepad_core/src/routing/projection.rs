//! Column whitelists and aliases per route.
//!
//! # Responsibility
//! - Translate caller-requested column names into SQL result expressions.
//! - Reject names outside the whitelist before any SQL is built.
//!
//! # Invariants
//! - Only expressions declared here are ever interpolated into `SELECT`.
//! - An empty request selects the full whitelist in declaration order.

use crate::contract::{
    ALL_COLUMNS, COLUMN_ID, COLUMN_TITLE, LIVE_FOLDER_ID, LIVE_FOLDER_NAME,
};
use crate::routing::router::Route;

/// One resolved result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedColumn {
    /// Column name as seen by the caller in the result set.
    pub output: &'static str,
    /// SQL expression placed in the select list.
    pub expression: String,
}

#[derive(Debug, Clone)]
struct ProjectionEntry {
    requested: &'static str,
    output: &'static str,
    source: &'static str,
}

/// Whitelist of requestable columns for one route.
#[derive(Debug, Clone)]
pub struct ProjectionMap {
    entries: Vec<ProjectionEntry>,
}

impl ProjectionMap {
    fn identity(columns: &[&'static str]) -> Self {
        Self {
            entries: columns
                .iter()
                .map(|&column| ProjectionEntry {
                    requested: column,
                    output: column,
                    source: column,
                })
                .collect(),
        }
    }

    fn live_folder() -> Self {
        Self {
            entries: vec![
                ProjectionEntry {
                    requested: COLUMN_ID,
                    output: LIVE_FOLDER_ID,
                    source: COLUMN_ID,
                },
                ProjectionEntry {
                    requested: COLUMN_TITLE,
                    output: LIVE_FOLDER_NAME,
                    source: COLUMN_TITLE,
                },
            ],
        }
    }

    /// Resolves `requested` columns, returning the first unknown name on failure.
    pub fn resolve<S: AsRef<str>>(&self, requested: &[S]) -> Result<Vec<ProjectedColumn>, String> {
        if requested.is_empty() {
            return Ok(self.entries.iter().map(Self::project).collect());
        }

        requested
            .iter()
            .map(|name| {
                let name = name.as_ref().trim();
                self.entries
                    .iter()
                    .find(|entry| entry.requested == name)
                    .map(Self::project)
                    .ok_or_else(|| name.to_string())
            })
            .collect()
    }

    /// Returns whether `name` is a result column name of this projection.
    pub fn has_output(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.output == name)
    }

    fn project(entry: &ProjectionEntry) -> ProjectedColumn {
        let expression = if entry.output == entry.source {
            entry.source.to_string()
        } else {
            format!("{} AS {}", entry.source, entry.output)
        };
        ProjectedColumn {
            output: entry.output,
            expression,
        }
    }
}

/// The two fixed projection maps, shared by all routes.
#[derive(Debug, Clone)]
pub struct ProjectionSet {
    notes: ProjectionMap,
    live_folder: ProjectionMap,
}

impl ProjectionSet {
    pub fn new() -> Self {
        Self {
            notes: ProjectionMap::identity(&ALL_COLUMNS),
            live_folder: ProjectionMap::live_folder(),
        }
    }

    pub fn for_route(&self, route: Route) -> &ProjectionMap {
        match route {
            Route::Collection | Route::Item(_) | Route::Search => &self.notes,
            Route::LiveFolder => &self.live_folder,
        }
    }
}

impl Default for ProjectionSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::ProjectionSet;
    use crate::routing::router::Route;

    #[test]
    fn empty_request_selects_full_whitelist() {
        let set = ProjectionSet::new();
        let columns = set.for_route(Route::Collection).resolve::<&str>(&[]).unwrap();
        let outputs: Vec<_> = columns.iter().map(|column| column.output).collect();
        assert_eq!(outputs, ["id", "title", "body", "created_at", "modified_at"]);
    }

    #[test]
    fn live_folder_renames_id_and_title() {
        let set = ProjectionSet::new();
        let columns = set.for_route(Route::LiveFolder).resolve::<&str>(&[]).unwrap();
        assert_eq!(columns[0].expression, "id AS _id");
        assert_eq!(columns[1].expression, "title AS name");
        assert_eq!(columns.len(), 2);
    }

    #[test]
    fn unlisted_columns_are_rejected() {
        let set = ProjectionSet::new();
        let err = set
            .for_route(Route::Item(1))
            .resolve(&["title", "sqlite_version()"])
            .unwrap_err();
        assert_eq!(err, "sqlite_version()");

        let err = set.for_route(Route::LiveFolder).resolve(&["body"]).unwrap_err();
        assert_eq!(err, "body");
    }
}
