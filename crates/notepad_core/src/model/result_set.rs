//! Materialized query results.

use crate::contract::{COLUMN_BODY, COLUMN_CREATED_AT, COLUMN_ID, COLUMN_MODIFIED_AT, COLUMN_TITLE};
use crate::model::note::Note;
use crate::routing::uri::NoteUri;
use crate::service::error::{StoreError, StoreResult};
use rusqlite::types::Value;

/// Rows returned by a query, under the resolved output column names.
///
/// The set watches the address its rows depend on: a change notification on
/// that address, an ancestor or a descendant means the rows may be stale.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    notification_uri: NoteUri,
}

impl ResultSet {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Vec<Value>>, notification_uri: NoteUri) -> Self {
        Self {
            columns,
            rows,
            notification_uri,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Address whose changes invalidate these rows.
    ///
    /// The collection address for collection, search and live-folder reads;
    /// the item address for item reads.
    pub fn notification_uri(&self) -> &NoteUri {
        &self.notification_uri
    }

    /// Returns whether a change on `changed` affects these rows.
    pub fn is_invalidated_by(&self, changed: &NoteUri) -> bool {
        *changed == self.notification_uri
            || changed.is_ancestor_of(&self.notification_uri)
            || self.notification_uri.is_ancestor_of(changed)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Raw value at `row`/`column`, `None` when either is out of range.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }

    pub fn get_i64(&self, row: usize, column: &str) -> Option<i64> {
        match self.value(row, column)? {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn get_text(&self, row: usize, column: &str) -> Option<&str> {
        match self.value(row, column)? {
            Value::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Decodes rows into typed notes.
    ///
    /// # Errors
    /// - `InvalidData` when a note column is missing from the projection or
    ///   holds a value of the wrong type (e.g. a NULL written by a caller).
    pub fn to_notes(&self) -> StoreResult<Vec<Note>> {
        (0..self.rows.len())
            .map(|row| {
                Ok(Note {
                    id: self.required_i64(row, COLUMN_ID)?,
                    title: self.required_text(row, COLUMN_TITLE)?,
                    body: self.required_text(row, COLUMN_BODY)?,
                    created_at: self.required_i64(row, COLUMN_CREATED_AT)?,
                    modified_at: self.required_i64(row, COLUMN_MODIFIED_AT)?,
                })
            })
            .collect()
    }

    fn required_i64(&self, row: usize, column: &str) -> StoreResult<i64> {
        self.get_i64(row, column).ok_or_else(|| {
            StoreError::InvalidData(format!("row {row} has no integer `{column}`"))
        })
    }

    fn required_text(&self, row: usize, column: &str) -> StoreResult<String> {
        self.get_text(row, column)
            .map(str::to_string)
            .ok_or_else(|| StoreError::InvalidData(format!("row {row} has no text `{column}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::ResultSet;
    use crate::routing::uri::NoteUri;
    use rusqlite::types::Value;

    fn item_set() -> ResultSet {
        ResultSet::new(
            vec!["id".to_string(), "title".to_string()],
            vec![vec![Value::Integer(4), Value::Text("t".to_string())]],
            NoteUri::new("auth", ["notes", "4"]),
        )
    }

    #[test]
    fn typed_getters_read_by_column_name() {
        let set = item_set();
        assert_eq!(set.get_i64(0, "id"), Some(4));
        assert_eq!(set.get_text(0, "title"), Some("t"));
        assert_eq!(set.get_text(0, "body"), None);
        assert_eq!(set.get_i64(1, "id"), None);
    }

    #[test]
    fn invalidation_follows_address_hierarchy() {
        let set = item_set();
        assert!(set.is_invalidated_by(&NoteUri::new("auth", ["notes", "4"])));
        assert!(set.is_invalidated_by(&NoteUri::new("auth", ["notes"])));
        assert!(!set.is_invalidated_by(&NoteUri::new("auth", ["notes", "5"])));
        assert!(!set.is_invalidated_by(&NoteUri::new("auth", ["live_folders", "notes"])));
    }

    #[test]
    fn to_notes_requires_full_projection() {
        assert!(item_set().to_notes().is_err());
    }
}
