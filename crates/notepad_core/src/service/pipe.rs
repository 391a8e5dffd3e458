//! Bounded in-memory byte pipe between two threads.
//!
//! # Invariants
//! - Dropping the writer is end-of-stream for the reader.
//! - Dropping the reader makes every later write fail with `BrokenPipe`.
//! - At most `capacity` chunks are buffered; writers block beyond that.

use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, SyncSender};

/// Creates a connected writer/reader pair.
pub fn pipe(capacity: usize) -> (PipeWriter, PipeReader) {
    let (sender, receiver) = mpsc::sync_channel(capacity.max(1));
    (
        PipeWriter { sender },
        PipeReader {
            receiver,
            pending: Vec::new(),
            offset: 0,
        },
    )
}

/// Write end. Each `write` call becomes one chunk.
pub struct PipeWriter {
    sender: SyncSender<Vec<u8>>,
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.sender
            .send(buf.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader closed"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Read end.
pub struct PipeReader {
    receiver: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    offset: usize,
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.offset >= self.pending.len() {
            match self.receiver.recv() {
                Ok(chunk) => {
                    self.pending = chunk;
                    self.offset = 0;
                }
                Err(_) => return Ok(0),
            }
        }

        let available = &self.pending[self.offset..];
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        self.offset += count;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::pipe;
    use std::io::{ErrorKind, Read, Write};
    use std::thread;

    #[test]
    fn reader_sees_all_bytes_then_eof() {
        let (mut writer, mut reader) = pipe(1);
        let producer = thread::spawn(move || {
            for part in ["ab", "", "cde", "f"] {
                writer.write_all(part.as_bytes()).unwrap();
            }
        });

        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        producer.join().unwrap();
        assert_eq!(out, "abcdef");
    }

    #[test]
    fn write_after_reader_drop_is_broken_pipe() {
        let (mut writer, reader) = pipe(1);
        drop(reader);
        let err = writer.write(b"x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BrokenPipe);
    }
}
