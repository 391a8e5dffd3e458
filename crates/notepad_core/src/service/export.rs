//! Plain-text export of one note through a pipe.
//!
//! # Responsibility
//! - Negotiate the export MIME type against a caller filter.
//! - Run a producer thread that renders the note and closes the pipe.
//!
//! # Invariants
//! - The producer owns the queried rows and drops them right after copying
//!   the title and body out, on success and failure alike.
//! - The write end is always closed when the producer exits.

use crate::contract::{COLUMN_BODY, COLUMN_TITLE, MIMETYPE_TEXT_PLAIN};
use crate::model::result_set::ResultSet;
use crate::routing::uri::NoteUri;
use crate::service::pipe::{pipe, PipeReader, PipeWriter};
use log::{info, warn};
use std::fmt;
use std::io::{self, BufWriter, Read, Write};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Stream types notes can be exported as.
pub const NOTE_STREAM_TYPES: [&str; 1] = [MIMETYPE_TEXT_PLAIN];

/// Columns the producer needs from the item query.
pub const EXPORT_PROJECTION: [&str; 2] = [COLUMN_TITLE, COLUMN_BODY];

/// Handle to the producer thread of one export.
pub type ProducerHandle = JoinHandle<io::Result<()>>;

/// Readable export of one note.
///
/// Reading to end-of-stream yields `"{title}\n\n{body}\n"` in UTF-8.
pub struct NoteStream {
    mime_type: &'static str,
    reader: PipeReader,
    producer: ProducerHandle,
}

impl NoteStream {
    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    /// Splits into the read end and the producer handle.
    ///
    /// Dropping the reader early makes the producer fail with `BrokenPipe`;
    /// joining the handle observes that outcome.
    pub fn into_parts(self) -> (PipeReader, ProducerHandle) {
        (self.reader, self.producer)
    }
}

impl fmt::Debug for NoteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoteStream")
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

impl Read for NoteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Returns the note stream types matching `filter`, e.g. `text/*` or `*/*`.
pub fn filter_stream_types(filter: &str) -> Vec<&'static str> {
    NOTE_STREAM_TYPES
        .iter()
        .copied()
        .filter(|concrete| mime_matches(filter, concrete))
        .collect()
}

/// Compares a concrete MIME type against a filter with `*` wildcards.
pub fn mime_matches(filter: &str, concrete: &str) -> bool {
    let filter = filter.trim().to_ascii_lowercase();
    let concrete = concrete.to_ascii_lowercase();
    let (Some((filter_type, filter_sub)), Some((concrete_type, concrete_sub))) =
        (filter.split_once('/'), concrete.split_once('/'))
    else {
        return false;
    };

    (filter_type == "*" || filter_type == concrete_type)
        && (filter_sub == "*" || filter_sub == concrete_sub)
}

/// Starts the producer for an already-verified, non-empty item result set.
pub(crate) fn spawn_text_export(
    uri: NoteUri,
    mime_type: &'static str,
    result_set: ResultSet,
    pipe_capacity: usize,
) -> io::Result<NoteStream> {
    let (writer, reader) = pipe(pipe_capacity);
    let producer = thread::Builder::new()
        .name("note-export".to_string())
        .spawn(move || produce(uri, result_set, writer))?;

    Ok(NoteStream {
        mime_type,
        reader,
        producer,
    })
}

fn produce(uri: NoteUri, result_set: ResultSet, writer: PipeWriter) -> io::Result<()> {
    let started_at = Instant::now();
    let title = result_set.get_text(0, COLUMN_TITLE).unwrap_or_default().to_string();
    let body = result_set.get_text(0, COLUMN_BODY).unwrap_or_default().to_string();
    drop(result_set);

    let result = write_note_text(writer, &title, &body);
    match &result {
        Ok(()) => info!(
            "event=note_export module=export status=ok uri={} bytes={} duration_ms={}",
            uri,
            title.len() + body.len() + 3,
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event=note_export module=export status=aborted uri={} duration_ms={} error={}",
            uri,
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

fn write_note_text(writer: PipeWriter, title: &str, body: &str) -> io::Result<()> {
    let mut out = BufWriter::new(writer);
    writeln!(out, "{title}")?;
    writeln!(out)?;
    writeln!(out, "{body}")?;
    out.flush()
}
