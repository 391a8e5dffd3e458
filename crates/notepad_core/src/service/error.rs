//! Store-level error taxonomy.

use crate::db::DbError;
use crate::routing::uri::NoteUri;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure returned by every store entry point.
///
/// Variants group into invalid requests (caller error, never retried),
/// `NotFound`, `WriteFailure` and read-side `Db` failures.
/// See [`StoreError::is_invalid_request`].
#[derive(Debug)]
pub enum StoreError {
    /// Address matched no registered pattern.
    UnknownUri(String),
    /// Operation is not legal for the addressed resource.
    UnsupportedOperation {
        uri: NoteUri,
        operation: &'static str,
    },
    /// Requested column is outside the route's projection whitelist.
    UnknownColumn { uri: NoteUri, column: String },
    /// Sort clause is not a list of whitelisted `column [ASC|DESC]` terms.
    InvalidSortOrder(String),
    /// Selection cannot be safely parenthesised into the store's filter.
    InvalidSelection {
        uri: NoteUri,
        reason: &'static str,
    },
    /// Search requires a non-blank selection.
    MissingSelection(NoteUri),
    /// Update called without any column to set.
    EmptyValues(NoteUri),
    /// A row the operation depends on does not exist.
    NotFound(NoteUri),
    /// Storage rejected a mutation; nothing was applied.
    WriteFailure { uri: NoteUri, source: DbError },
    /// Storage failed while reading.
    Db(DbError),
    /// Stored row could not be decoded.
    InvalidData(String),
    /// Export producer could not be started.
    Io(std::io::Error),
}

impl StoreError {
    /// Returns whether this is a caller error rather than a storage condition.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            Self::UnknownUri(_)
                | Self::UnsupportedOperation { .. }
                | Self::UnknownColumn { .. }
                | Self::InvalidSortOrder(_)
                | Self::InvalidSelection { .. }
                | Self::MissingSelection(_)
                | Self::EmptyValues(_)
        )
    }

    pub(crate) fn write_failure(uri: &NoteUri, source: impl Into<DbError>) -> Self {
        Self::WriteFailure {
            uri: uri.clone(),
            source: source.into(),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownUri(uri) => write!(f, "unknown URI {uri}"),
            Self::UnsupportedOperation { uri, operation } => {
                write!(f, "{operation} is not supported for URI {uri}")
            }
            Self::UnknownColumn { uri, column } => {
                write!(f, "invalid column `{column}` for URI {uri}")
            }
            Self::InvalidSortOrder(order) => write!(f, "invalid sort order `{order}`"),
            Self::InvalidSelection { uri, reason } => {
                write!(f, "invalid selection for URI {uri}: {reason}")
            }
            Self::MissingSelection(uri) => write!(f, "selection is required for URI {uri}"),
            Self::EmptyValues(uri) => write!(f, "no values to update for URI {uri}"),
            Self::NotFound(uri) => write!(f, "unable to query {uri}"),
            Self::WriteFailure { uri, source } => write!(f, "failed to write {uri}: {source}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid note data: {message}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::WriteFailure { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
