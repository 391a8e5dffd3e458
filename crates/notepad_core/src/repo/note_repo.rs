//! Note table repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Execute select/insert/update/delete against the single `notes` table.
//! - Compose store-imposed and caller-supplied predicates.
//!
//! # Invariants
//! - Identifiers reaching SQL come from `contract` or the projection whitelist.
//! - A caller predicate is parenthesised before being ANDed. Callers pass
//!   only predicates accepted by `Selection::check_enclosable`, so the
//!   predicate can narrow an identity filter but never widen it.
//! - Every write is a single statement and therefore atomic.

use crate::contract::{COLUMN_ID, TABLE_NAME};
use crate::db::DbResult;
use crate::model::note::{NoteId, NoteValues};
use crate::routing::projection::ProjectedColumn;
use crate::service::request::Selection;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

/// Effective `WHERE` clause with its bind arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    clause: Option<String>,
    args: Vec<Value>,
}

impl WhereClause {
    /// Restricts to one id, optionally narrowed further by `selection`.
    pub fn for_id(id: NoteId, selection: Option<&Selection>) -> Self {
        Self::compose(Some(format!("{COLUMN_ID} = {id}")), selection)
    }

    /// Uses `selection` as-is; a blank or absent selection matches every row.
    pub fn from_selection(selection: Option<&Selection>) -> Self {
        Self::compose(None, selection)
    }

    fn compose(identity: Option<String>, selection: Option<&Selection>) -> Self {
        let caller = selection.filter(|selection| !selection.is_blank());
        let args = caller.map(|selection| selection.args.clone()).unwrap_or_default();
        let clause = match (identity, caller) {
            (Some(identity), Some(caller)) => Some(format!("{identity} AND ({})", caller.clause)),
            (Some(identity), None) => Some(identity),
            (None, Some(caller)) => Some(format!("({})", caller.clause)),
            (None, None) => None,
        };
        Self { clause, args }
    }

    pub fn clause(&self) -> Option<&str> {
        self.clause.as_deref()
    }

    fn sql_suffix(&self) -> String {
        self.clause
            .as_ref()
            .map(|clause| format!(" WHERE {clause}"))
            .unwrap_or_default()
    }
}

/// Repository interface over the notes table.
pub trait NoteRepository {
    /// Selects `columns` from matching rows in `order_by` order.
    fn select_rows(
        &self,
        columns: &[ProjectedColumn],
        filter: &WhereClause,
        order_by: &str,
    ) -> DbResult<Vec<Vec<Value>>>;
    /// Inserts one row with defaults already applied; returns its assigned id.
    fn insert_row(&self, values: &NoteValues) -> DbResult<NoteId>;
    /// Sets present `values` on matching rows; returns the affected count.
    fn update_rows(&self, values: &NoteValues, filter: &WhereClause) -> DbResult<usize>;
    /// Deletes matching rows; returns the affected count.
    fn delete_rows(&self, filter: &WhereClause) -> DbResult<usize>;
}

/// SQLite-backed notes repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Wraps a connection whose schema is already applied.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn select_rows(
        &self,
        columns: &[ProjectedColumn],
        filter: &WhereClause,
        order_by: &str,
    ) -> DbResult<Vec<Vec<Value>>> {
        let select_list = columns
            .iter()
            .map(|column| column.expression.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {select_list} FROM {TABLE_NAME}{} ORDER BY {order_by};",
            filter.sql_suffix()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(filter.args.iter()))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                values.push(row.get::<_, Value>(index)?);
            }
            result.push(values);
        }
        Ok(result)
    }

    fn insert_row(&self, values: &NoteValues) -> DbResult<NoteId> {
        let columns = values.columns();
        let names = columns
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        self.conn.execute(
            &format!("INSERT INTO {TABLE_NAME} ({names}) VALUES ({placeholders});"),
            params_from_iter(columns.into_iter().map(|(_, value)| value)),
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_rows(&self, values: &NoteValues, filter: &WhereClause) -> DbResult<usize> {
        let columns = values.columns();
        let assignments = columns
            .iter()
            .map(|(name, _)| format!("{name} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let bind_values = columns
            .into_iter()
            .map(|(_, value)| value)
            .chain(filter.args.iter().cloned());

        let changed = self.conn.execute(
            &format!(
                "UPDATE {TABLE_NAME} SET {assignments}{};",
                filter.sql_suffix()
            ),
            params_from_iter(bind_values),
        )?;
        Ok(changed)
    }

    fn delete_rows(&self, filter: &WhereClause) -> DbResult<usize> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {TABLE_NAME}{};", filter.sql_suffix()),
            params_from_iter(filter.args.iter()),
        )?;
        Ok(changed)
    }
}
