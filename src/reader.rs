//! Reading lines from a resolved position

use std::io;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::navigation::lines::LineScanner;
use crate::source::{LogPointer, LogSource, SourceId};

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("pointer into source '{pointer}' given to the reader of '{reader}'")]
    ForeignPointer { pointer: SourceId, reader: SourceId },

    #[error("source '{0}' is shorter than the pointer offset")]
    SourceChanged(SourceId),

    #[error("I/O error reading source '{source_id}'")]
    Io {
        source_id: SourceId,
        #[source]
        cause: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ReaderError>;

/// Lines read from a pointer, with the pointer to continue from
#[derive(Debug, Clone, Serialize)]
pub struct LineBatch {
    pub lines: Vec<String>,
    pub next: LogPointer,
}

/// Sequential line reader over one source
///
/// Only complete lines are returned. A trailing line without its newline is
/// left for the next call, since a live log may still be writing it.
#[derive(Clone)]
pub struct LogReader {
    source: Arc<dyn LogSource>,
    read_buffer: usize,
}

impl LogReader {
    pub fn new(source: Arc<dyn LogSource>, read_buffer: usize) -> Self {
        Self {
            source,
            read_buffer,
        }
    }

    /// Reads up to `max_lines` lines starting at `pointer`
    ///
    /// Blocking; call from `spawn_blocking` inside async code.
    pub fn read_lines(&self, pointer: &LogPointer, max_lines: usize) -> Result<LineBatch> {
        let id = self.source.id();
        if pointer.source() != id {
            return Err(ReaderError::ForeignPointer {
                pointer: pointer.source().clone(),
                reader: id.clone(),
            });
        }

        let io_error = |cause| ReaderError::Io {
            source_id: id.clone(),
            cause,
        };
        let len = self.source.fingerprint().map_err(io_error)?.len;
        if pointer.offset() > len {
            return Err(ReaderError::SourceChanged(id.clone()));
        }

        let mut scanner = LineScanner::new(&*self.source, len, self.read_buffer, usize::MAX);
        let mut lines = Vec::new();
        let mut at = pointer.offset();
        while lines.len() < max_lines {
            match scanner.read_line(at).map_err(io_error)? {
                Some(line) if line.terminated => {
                    at = line.end;
                    lines.push(line.head);
                }
                _ => break,
            }
        }

        debug!(source = %id, from = pointer.offset(), to = at, lines = lines.len(), "Lines read");
        Ok(LineBatch {
            lines,
            next: LogPointer::new(id.clone(), at, len),
        })
    }
}
