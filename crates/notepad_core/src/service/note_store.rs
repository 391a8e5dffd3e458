//! URI-addressed note store.
//!
//! # Responsibility
//! - Route every call through the `RoutingTable` and projection whitelist.
//! - Compose identity and caller predicates for item-scoped operations.
//! - Serialize writes through one connection; spread reads over a pool.
//! - Notify subscribers after every mutation.
//! - Start plain-text exports for single notes.
//!
//! # Invariants
//! - Item operations never touch rows with a different id.
//! - Every insert/update/delete notifies exactly once, even for zero rows,
//!   with the canonical address of what changed.
//! - Caller selections are checked before composition so they cannot close
//!   the parentheses that confine them.
//! - Search and live-folder rows depend on the collection address; their
//!   result sets and subscriptions follow collection changes.
//! - Notification runs after the writer lock is released.
//! - SEARCH without a non-blank selection is rejected, never widened to the
//!   whole table.

use crate::config::StoreConfig;
use crate::contract::{is_table_column, CONTENT_ITEM_TYPE, CONTENT_TYPE, DEFAULT_SORT_ORDER};
use crate::db::{open_db, open_db_in_memory, open_db_read_only, DbError};
use crate::model::note::{NoteId, NoteValues};
use crate::model::result_set::ResultSet;
use crate::notify::registry::{ChangeObserver, ObserverRegistry, SubscriptionId};
use crate::repo::note_repo::{NoteRepository, SqliteNoteRepository, WhereClause};
use crate::routing::projection::ProjectionMap;
use crate::routing::router::{Route, RoutingTable};
use crate::routing::uri::NoteUri;
use crate::service::error::{StoreError, StoreResult};
use crate::service::export::{filter_stream_types, spawn_text_export, NoteStream, EXPORT_PROJECTION};
use crate::service::request::{NoteQuery, Selection};
use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

static SORT_TERM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*([a-z_][a-z0-9_]*)(?:\s+(asc|desc))?\s*$").expect("valid sort term regex")
});

/// Single-table note store addressed by `NoteUri`.
///
/// `NoteStore` is `Send + Sync`; share it with `Arc` across callers.
pub struct NoteStore {
    config: StoreConfig,
    routes: RoutingTable,
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    next_reader: AtomicUsize,
    observers: ObserverRegistry,
}

impl NoteStore {
    /// Opens (or creates) a file-backed store.
    ///
    /// An older on-disk schema is dropped and recreated; see `db::migrations`.
    pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> StoreResult<Self> {
        let path = path.as_ref();
        let writer = open_db(path, config.busy_timeout())?;
        let readers = (0..config.read_pool_size)
            .map(|_| open_db_read_only(path, config.busy_timeout()).map(Mutex::new))
            .collect::<Result<Vec<_>, DbError>>()?;
        info!(
            "event=store_open module=store status=ok mode=file readers={} authority={}",
            readers.len(),
            config.authority
        );
        Ok(Self::from_parts(config, writer, readers))
    }

    /// Opens a private in-memory store; reads share the writer connection.
    pub fn open_in_memory(config: StoreConfig) -> StoreResult<Self> {
        let writer = open_db_in_memory(config.busy_timeout())?;
        info!(
            "event=store_open module=store status=ok mode=memory authority={}",
            config.authority
        );
        Ok(Self::from_parts(config, writer, Vec::new()))
    }

    fn from_parts(config: StoreConfig, writer: Connection, readers: Vec<Mutex<Connection>>) -> Self {
        Self {
            routes: RoutingTable::new(config.authority.as_str()),
            config,
            writer: Mutex::new(writer),
            readers,
            next_reader: AtomicUsize::new(0),
            observers: ObserverRegistry::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Address builders and router for this store's authority.
    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    pub fn observers(&self) -> &ObserverRegistry {
        &self.observers
    }

    /// Registers `observer` for changes on `uri`.
    ///
    /// A search or live-folder address watches the whole collection,
    /// descendants included. Item addresses are normalized to `item_uri(id)`.
    pub fn subscribe(
        &self,
        uri: NoteUri,
        notify_for_descendants: bool,
        observer: Arc<dyn ChangeObserver>,
    ) -> SubscriptionId {
        let (uri, notify_for_descendants) = self.watch_target(uri, notify_for_descendants);
        self.observers.subscribe(uri, notify_for_descendants, observer)
    }

    /// Registers a channel-backed subscription on `uri`; see `subscribe`.
    pub fn subscribe_channel(
        &self,
        uri: NoteUri,
        notify_for_descendants: bool,
    ) -> (SubscriptionId, Receiver<NoteUri>) {
        let (uri, notify_for_descendants) = self.watch_target(uri, notify_for_descendants);
        self.observers.subscribe_channel(uri, notify_for_descendants)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Resolves `uri`, failing with `UnknownUri` when nothing matches.
    pub fn route(&self, uri: &NoteUri) -> StoreResult<Route> {
        self.routes
            .route(uri)
            .ok_or_else(|| StoreError::UnknownUri(uri.to_string()))
    }

    /// MIME type of the resource at `uri`.
    pub fn get_type(&self, uri: &NoteUri) -> StoreResult<&'static str> {
        Ok(match self.route(uri)? {
            Route::Item(_) => CONTENT_ITEM_TYPE,
            Route::Collection | Route::Search | Route::LiveFolder => CONTENT_TYPE,
        })
    }

    /// Runs a query against the resource at `uri`.
    ///
    /// Zero matching rows is an empty `ResultSet`, not an error. The result
    /// set remembers the address it depends on: the item for item reads, the
    /// collection for every other route.
    pub fn query(&self, uri: &NoteUri, request: &NoteQuery) -> StoreResult<ResultSet> {
        let started_at = Instant::now();
        let route = self.route(uri)?;
        let projection = self.routes.projection(route);
        let columns = projection
            .resolve(&request.projection)
            .map_err(|column| StoreError::UnknownColumn {
                uri: uri.clone(),
                column,
            })?;
        let order_by = resolve_sort_order(request.sort_order.as_deref(), projection)?;
        let selection = checked_selection(uri, request.selection.as_ref())?;

        let filter = match route {
            Route::Item(id) => WhereClause::for_id(id, selection),
            Route::Search => match selection {
                Some(selection) if !selection.is_blank() => {
                    WhereClause::from_selection(Some(selection))
                }
                _ => return Err(StoreError::MissingSelection(uri.clone())),
            },
            Route::Collection | Route::LiveFolder => WhereClause::from_selection(selection),
        };

        let rows = self.with_reader(|conn| {
            SqliteNoteRepository::new(conn)
                .select_rows(&columns, &filter, &order_by)
                .map_err(StoreError::from)
        })?;

        debug!(
            "event=note_query module=store status=ok route={} rows={} duration_ms={}",
            route.name(),
            rows.len(),
            started_at.elapsed().as_millis()
        );
        let names = columns.iter().map(|column| column.output.to_string()).collect();
        Ok(ResultSet::new(names, rows, self.routes.dependency_uri(route)))
    }

    /// Inserts a note into the collection at `uri` and returns its id.
    ///
    /// Missing columns are defaulted: `title` to the configured untitled
    /// string, `body` to `""`, both timestamps to the same current instant.
    /// Subscribers are notified with the new item's address.
    pub fn insert(&self, uri: &NoteUri, values: NoteValues) -> StoreResult<NoteId> {
        let started_at = Instant::now();
        if self.route(uri)? != Route::Collection {
            return Err(StoreError::UnsupportedOperation {
                uri: uri.clone(),
                operation: "insert",
            });
        }

        let values = values.with_insert_defaults(&self.config.untitled_title, now_epoch_ms());
        let id = self.with_writer(uri, |conn| SqliteNoteRepository::new(conn).insert_row(&values))?;

        info!(
            "event=note_insert module=store status=ok id={} duration_ms={}",
            id,
            started_at.elapsed().as_millis()
        );
        self.observers.notify(&self.routes.item_uri(id));
        Ok(id)
    }

    /// Updates matching rows with the present `values`.
    ///
    /// For an item address the effective filter is `id = <id> AND (selection)`.
    /// For the collection address the selection is used as-is; `None` updates
    /// every row.
    pub fn update(
        &self,
        uri: &NoteUri,
        values: &NoteValues,
        selection: Option<&Selection>,
    ) -> StoreResult<usize> {
        let started_at = Instant::now();
        let (filter, changed_uri) = self.mutation_filter(uri, selection, "update")?;
        if values.is_empty() {
            return Err(StoreError::EmptyValues(uri.clone()));
        }

        let count =
            self.with_writer(uri, |conn| SqliteNoteRepository::new(conn).update_rows(values, &filter))?;

        info!(
            "event=note_update module=store status=ok rows={} duration_ms={}",
            count,
            started_at.elapsed().as_millis()
        );
        self.observers.notify(&changed_uri);
        Ok(count)
    }

    /// Deletes matching rows.
    ///
    /// For an item address the effective filter is `id = <id> AND (selection)`.
    ///
    /// **Destructive default:** on the collection address a `None` (or blank)
    /// selection deletes every note.
    pub fn delete(&self, uri: &NoteUri, selection: Option<&Selection>) -> StoreResult<usize> {
        let started_at = Instant::now();
        let (filter, changed_uri) = self.mutation_filter(uri, selection, "delete")?;
        if filter.clause().is_none() {
            warn!("event=note_delete module=store status=start scope=all_rows");
        }

        let count = self.with_writer(uri, |conn| SqliteNoteRepository::new(conn).delete_rows(&filter))?;

        info!(
            "event=note_delete module=store status=ok rows={} duration_ms={}",
            count,
            started_at.elapsed().as_millis()
        );
        self.observers.notify(&changed_uri);
        Ok(count)
    }

    /// Export MIME types available at `uri` for `mime_filter`; empty when the
    /// address cannot be streamed.
    pub fn stream_types(&self, uri: &NoteUri, mime_filter: &str) -> StoreResult<Vec<&'static str>> {
        Ok(match self.route(uri)? {
            Route::Item(_) => filter_stream_types(mime_filter),
            Route::Collection | Route::Search | Route::LiveFolder => Vec::new(),
        })
    }

    /// Opens a plain-text export of the note at `uri`.
    ///
    /// Returns `Ok(None)` when the address or filter has no stream type. The
    /// returned stream is readable immediately; a producer thread fills it.
    ///
    /// # Errors
    /// - `UnknownUri` for unroutable addresses.
    /// - `NotFound` when the item does not exist.
    pub fn open_typed_stream(
        &self,
        uri: &NoteUri,
        mime_filter: &str,
    ) -> StoreResult<Option<NoteStream>> {
        let types = self.stream_types(uri, mime_filter)?;
        let Some(&mime_type) = types.first() else {
            debug!("event=note_export module=store status=unsupported uri={uri}");
            return Ok(None);
        };

        let result_set = self.query(uri, &NoteQuery::new().projection(EXPORT_PROJECTION))?;
        if result_set.is_empty() {
            return Err(StoreError::NotFound(uri.clone()));
        }

        let stream = spawn_text_export(
            uri.clone(),
            mime_type,
            result_set,
            self.config.export_pipe_capacity,
        )
        .map_err(StoreError::Io)?;
        Ok(Some(stream))
    }

    /// Builds the write filter and the canonical address to notify.
    fn mutation_filter(
        &self,
        uri: &NoteUri,
        selection: Option<&Selection>,
        operation: &'static str,
    ) -> StoreResult<(WhereClause, NoteUri)> {
        let route = self.route(uri)?;
        let filter = match route {
            Route::Item(id) => WhereClause::for_id(id, checked_selection(uri, selection)?),
            Route::Collection => WhereClause::from_selection(checked_selection(uri, selection)?),
            Route::Search | Route::LiveFolder => {
                return Err(StoreError::UnsupportedOperation {
                    uri: uri.clone(),
                    operation,
                })
            }
        };
        Ok((filter, self.routes.dependency_uri(route)))
    }

    fn watch_target(&self, uri: NoteUri, notify_for_descendants: bool) -> (NoteUri, bool) {
        match self.routes.route(&uri) {
            Some(route @ (Route::Search | Route::LiveFolder)) => {
                (self.routes.dependency_uri(route), true)
            }
            Some(route @ Route::Item(_)) => {
                (self.routes.dependency_uri(route), notify_for_descendants)
            }
            Some(Route::Collection) | None => (uri, notify_for_descendants),
        }
    }

    fn with_reader<T>(&self, read: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        if self.readers.is_empty() {
            let conn = lock(&self.writer, "writer")?;
            return read(&conn);
        }

        let index = self.next_reader.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = lock(&self.readers[index], "reader")?;
        read(&conn)
    }

    fn with_writer<T>(
        &self,
        uri: &NoteUri,
        write: impl FnOnce(&Connection) -> Result<T, DbError>,
    ) -> StoreResult<T> {
        let conn = lock(&self.writer, "writer")?;
        write(&conn).map_err(|err| {
            error!("event=note_write module=store status=error uri={uri} error={err}");
            StoreError::write_failure(uri, err)
        })
    }
}

fn checked_selection<'a>(
    uri: &NoteUri,
    selection: Option<&'a Selection>,
) -> StoreResult<Option<&'a Selection>> {
    match selection {
        Some(selection) if !selection.is_blank() => {
            selection
                .check_enclosable()
                .map_err(|reason| StoreError::InvalidSelection {
                    uri: uri.clone(),
                    reason,
                })?;
            Ok(Some(selection))
        }
        other => Ok(other),
    }
}

fn lock<'a>(conn: &'a Mutex<Connection>, which: &'static str) -> StoreResult<MutexGuard<'a, Connection>> {
    conn.lock()
        .map_err(|_| StoreError::Db(DbError::Poisoned(which)))
}

/// Validates a caller sort clause, or returns the default.
///
/// Accepts comma-separated `column [ASC|DESC]` terms where each column is a
/// table column or an output name of `projection`.
fn resolve_sort_order(order: Option<&str>, projection: &ProjectionMap) -> StoreResult<String> {
    let Some(order) = order.filter(|order| !order.trim().is_empty()) else {
        return Ok(DEFAULT_SORT_ORDER.to_string());
    };

    order
        .split(',')
        .map(|term| {
            let captures = SORT_TERM_RE
                .captures(term)
                .ok_or_else(|| StoreError::InvalidSortOrder(order.to_string()))?;
            let column = &captures[1];
            if !is_table_column(column) && !projection.has_output(column) {
                return Err(StoreError::InvalidSortOrder(order.to_string()));
            }
            Ok(match captures.get(2) {
                Some(direction) => format!("{column} {}", direction.as_str().to_ascii_uppercase()),
                None => column.to_string(),
            })
        })
        .collect::<StoreResult<Vec<_>>>()
        .map(|terms| terms.join(", "))
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::resolve_sort_order;
    use crate::routing::projection::ProjectionSet;
    use crate::routing::router::Route;

    #[test]
    fn sort_order_defaults_and_normalizes() {
        let set = ProjectionSet::new();
        let notes = set.for_route(Route::Collection);
        assert_eq!(resolve_sort_order(None, notes).unwrap(), "modified_at DESC");
        assert_eq!(resolve_sort_order(Some("  "), notes).unwrap(), "modified_at DESC");
        assert_eq!(
            resolve_sort_order(Some("title asc, id"), notes).unwrap(),
            "title ASC, id"
        );
    }

    #[test]
    fn sort_order_rejects_expressions_and_unknown_columns() {
        let set = ProjectionSet::new();
        let notes = set.for_route(Route::Collection);
        for order in ["random()", "title; DROP TABLE notes", "owner DESC", "id,"] {
            assert!(resolve_sort_order(Some(order), notes).is_err(), "{order}");
        }
    }

    #[test]
    fn live_folder_accepts_alias_names() {
        let set = ProjectionSet::new();
        let live = set.for_route(Route::LiveFolder);
        assert_eq!(resolve_sort_order(Some("name DESC"), live).unwrap(), "name DESC");
    }
}
