//! Note domain model.
//!
//! # Responsibility
//! - Define the persisted note record and the partial column set used by writes.
//!
//! # Invariants
//! - `created_at <= modified_at` is a convention, not enforced here.
//! - `NoteValues` can only name persisted, writable columns.

use crate::contract::{COLUMN_BODY, COLUMN_CREATED_AT, COLUMN_MODIFIED_AT, COLUMN_TITLE};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

/// Storage-assigned note identifier.
pub type NoteId = i64;

/// One persisted note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub body: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Callers advance it on update.
    pub modified_at: i64,
}

/// Partial column set for insert and update.
///
/// Absent fields are left untouched by update and defaulted by insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<i64>,
}

impl NoteValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn created_at(mut self, epoch_ms: i64) -> Self {
        self.created_at = Some(epoch_ms);
        self
    }

    pub fn modified_at(mut self, epoch_ms: i64) -> Self {
        self.modified_at = Some(epoch_ms);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.created_at.is_none()
            && self.modified_at.is_none()
    }

    /// Fills every absent column for a fresh row.
    ///
    /// Both timestamps share the single `now_ms` instant when defaulted.
    pub fn with_insert_defaults(mut self, untitled: &str, now_ms: i64) -> Self {
        self.created_at.get_or_insert(now_ms);
        self.modified_at.get_or_insert(now_ms);
        self.title.get_or_insert_with(|| untitled.to_string());
        self.body.get_or_insert_with(String::new);
        self
    }

    /// Present columns paired with their bind values, in contract order.
    pub fn columns(&self) -> Vec<(&'static str, Value)> {
        let mut columns = Vec::with_capacity(4);
        if let Some(title) = self.title.as_ref() {
            columns.push((COLUMN_TITLE, Value::Text(title.clone())));
        }
        if let Some(body) = self.body.as_ref() {
            columns.push((COLUMN_BODY, Value::Text(body.clone())));
        }
        if let Some(created_at) = self.created_at {
            columns.push((COLUMN_CREATED_AT, Value::Integer(created_at)));
        }
        if let Some(modified_at) = self.modified_at {
            columns.push((COLUMN_MODIFIED_AT, Value::Integer(modified_at)));
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::NoteValues;

    #[test]
    fn insert_defaults_keep_supplied_values() {
        let values = NoteValues::new()
            .title("kept")
            .with_insert_defaults("Untitled", 10);
        assert_eq!(values.title.as_deref(), Some("kept"));
        assert_eq!(values.body.as_deref(), Some(""));
        assert_eq!(values.created_at, Some(10));
        assert_eq!(values.modified_at, Some(10));
    }

    #[test]
    fn columns_lists_only_present_fields() {
        let values = NoteValues::new().body("b").modified_at(3);
        let names: Vec<_> = values.columns().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["body", "modified_at"]);
        assert!(NoteValues::new().is_empty());
    }

    #[test]
    fn values_deserialize_from_partial_json() {
        let values: NoteValues = serde_json::from_str(r#"{"title":"X"}"#).unwrap();
        assert_eq!(values, NoteValues::new().title("X"));
    }
}
