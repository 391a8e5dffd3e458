//! Static storage and addressing contract for notes.
//!
//! # Responsibility
//! - Name the table, its columns, the URI paths and MIME types.
//! - Hold the default ordering applied to collection queries.
//!
//! # Invariants
//! - Column names here are the only identifiers that reach SQL unquoted.
//! - `ALL_COLUMNS` order is the default projection order.

/// Default authority used when a config does not override it.
pub const DEFAULT_AUTHORITY: &str = "org.notepad.provider";

/// URI scheme used when rendering addresses.
pub const SCHEME: &str = "content";

/// The single persisted table.
pub const TABLE_NAME: &str = "notes";

pub const COLUMN_ID: &str = "id";
pub const COLUMN_TITLE: &str = "title";
pub const COLUMN_BODY: &str = "body";
pub const COLUMN_CREATED_AT: &str = "created_at";
pub const COLUMN_MODIFIED_AT: &str = "modified_at";

/// Every persisted column, in default projection order.
pub const ALL_COLUMNS: [&str; 5] = [
    COLUMN_ID,
    COLUMN_TITLE,
    COLUMN_BODY,
    COLUMN_CREATED_AT,
    COLUMN_MODIFIED_AT,
];

/// Output name of the id column in the live folder view.
pub const LIVE_FOLDER_ID: &str = "_id";
/// Output name of the title column in the live folder view.
pub const LIVE_FOLDER_NAME: &str = "name";

/// Path segments.
pub const PATH_NOTES: &str = "notes";
pub const PATH_SEARCH: &str = "search";
pub const PATH_LIVE_FOLDERS: &str = "live_folders";

/// MIME type of collection-shaped addresses.
pub const CONTENT_TYPE: &str = "vnd.notepad.cursor.dir/vnd.notepad.note";
/// MIME type of a single note address.
pub const CONTENT_ITEM_TYPE: &str = "vnd.notepad.cursor.item/vnd.notepad.note";
/// The only stream type notes can be exported as.
pub const MIMETYPE_TEXT_PLAIN: &str = "text/plain";

/// Applied when a query does not supply its own order.
pub const DEFAULT_SORT_ORDER: &str = "modified_at DESC";

/// Title used when an insert omits one.
pub const DEFAULT_UNTITLED: &str = "Untitled";

/// Returns whether `name` is a persisted column.
pub fn is_table_column(name: &str) -> bool {
    ALL_COLUMNS.contains(&name)
}
