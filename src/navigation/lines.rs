//! Chunked line access over a [`LogSource`]

use std::io;

use crate::source::LogSource;

/// One line of a source
#[derive(Debug, Clone)]
pub(crate) struct Line {
    /// Offset of the first byte
    pub start: u64,
    /// Offset just past the line terminator (or the scan limit)
    pub end: u64,
    /// Leading bytes of the line, lossily decoded, without terminator
    pub head: String,
    /// Whether the line ended with `\n` rather than the scan limit
    pub terminated: bool,
}

/// Reads lines out of a source one buffer at a time
///
/// `limit` pins the scan to the length observed when navigation started, so
/// content appended meanwhile is never looked at.
pub(crate) struct LineScanner<'a> {
    source: &'a dyn LogSource,
    limit: u64,
    head_limit: usize,
    buf: Vec<u8>,
}

impl<'a> LineScanner<'a> {
    pub(crate) fn new(source: &'a dyn LogSource, limit: u64, chunk: usize, head_limit: usize) -> Self {
        Self {
            source,
            limit,
            head_limit,
            buf: vec![0; chunk.max(1)],
        }
    }

    fn fill(&mut self, at: u64) -> io::Result<usize> {
        if at >= self.limit {
            return Ok(0);
        }
        let want = (self.limit - at).min(self.buf.len() as u64) as usize;
        self.source.read_at(at, &mut self.buf[..want])
    }

    /// Offset of the first line starting at or after `pos`
    ///
    /// Returns the scan limit when no line starts in `[pos, limit)`.
    pub(crate) fn line_start_at_or_after(&mut self, pos: u64) -> io::Result<u64> {
        if pos == 0 {
            return Ok(0);
        }
        if pos >= self.limit {
            return Ok(self.limit);
        }

        // A line starts at `pos` iff the byte before it is a newline
        let mut at = pos - 1;
        loop {
            let n = self.fill(at)?;
            if n == 0 {
                return Ok(self.limit);
            }
            if let Some(i) = self.buf[..n].iter().position(|&b| b == b'\n') {
                return Ok(at + i as u64 + 1);
            }
            at += n as u64;
        }
    }

    /// Reads the line starting at `start`, `None` at the scan limit
    pub(crate) fn read_line(&mut self, start: u64) -> io::Result<Option<Line>> {
        if start >= self.limit {
            return Ok(None);
        }

        let mut head = Vec::new();
        let mut at = start;
        loop {
            let n = self.fill(at)?;
            if n == 0 {
                break;
            }
            let newline = self.buf[..n].iter().position(|&b| b == b'\n');
            let taken = newline.unwrap_or(n);
            let room = self.head_limit.saturating_sub(head.len());
            head.extend_from_slice(&self.buf[..taken.min(room)]);

            if let Some(i) = newline {
                return Ok(Some(Line {
                    start,
                    end: at + i as u64 + 1,
                    head: decode(head),
                    terminated: true,
                }));
            }
            at += n as u64;
        }

        Ok(Some(Line {
            start,
            end: at,
            head: decode(head),
            terminated: false,
        }))
    }
}

fn decode(mut bytes: Vec<u8>) -> String {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    const TEXT: &str = "alpha\nbravo charlie\n\ndelta";

    #[test]
    fn test_line_starts() {
        let source = MemorySource::new("mem", TEXT);
        // Tiny chunks force several reads per line
        let mut scanner = LineScanner::new(&source, TEXT.len() as u64, 3, 1024);

        assert_eq!(scanner.line_start_at_or_after(0).unwrap(), 0);
        assert_eq!(scanner.line_start_at_or_after(1).unwrap(), 6);
        assert_eq!(scanner.line_start_at_or_after(6).unwrap(), 6);
        assert_eq!(scanner.line_start_at_or_after(7).unwrap(), 20);
        assert_eq!(scanner.line_start_at_or_after(21).unwrap(), 21);
        assert_eq!(scanner.line_start_at_or_after(22).unwrap(), 26);
    }

    #[test]
    fn test_read_lines() {
        let source = MemorySource::new("mem", TEXT);
        let mut scanner = LineScanner::new(&source, TEXT.len() as u64, 4, 1024);

        let line = scanner.read_line(6).unwrap().unwrap();
        assert_eq!(line.head, "bravo charlie");
        assert_eq!(line.end, 20);
        assert!(line.terminated);

        let empty = scanner.read_line(20).unwrap().unwrap();
        assert_eq!(empty.head, "");
        assert_eq!(empty.end, 21);

        let last = scanner.read_line(21).unwrap().unwrap();
        assert_eq!(last.head, "delta");
        assert!(!last.terminated);
        assert_eq!(last.end, 26);

        assert!(scanner.read_line(26).unwrap().is_none());
    }

    #[test]
    fn test_head_limit_and_crlf() {
        let source = MemorySource::new("mem", "0123456789\r\nnext\r\n");
        let mut scanner = LineScanner::new(&source, 18, 5, 4);

        let line = scanner.read_line(0).unwrap().unwrap();
        assert_eq!(line.head, "0123");
        assert_eq!(line.end, 12);

        let mut scanner = LineScanner::new(&source, 18, 5, 1024);
        assert_eq!(scanner.read_line(12).unwrap().unwrap().head, "next");
    }

    #[test]
    fn test_limit_hides_appended_bytes() {
        let source = MemorySource::new("mem", "one\ntwo\n");
        let mut scanner = LineScanner::new(&source, 4, 16, 1024);
        source.append(b"three\n").unwrap();

        assert!(scanner.read_line(4).unwrap().is_none());
        assert_eq!(scanner.line_start_at_or_after(2).unwrap(), 4);
    }
}
