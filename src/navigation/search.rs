//! Timestamp binary search over a byte-addressed log
//!
//! A probe at byte `p` yields the first record (line with a parseable
//! timestamp) starting at or after `p`. Probing is monotone in `p`, so the
//! smallest `p` whose probed record satisfies a monotone predicate can be
//! found by bisecting `[0, len]`. The record at `p - 1` is then the direct
//! predecessor of the record found at `p`.
//!
//! Resolution uses floor semantics with the earliest duplicate:
//! 1. find the first record with `ts >= target`; an exact hit is the answer
//! 2. otherwise its predecessor carries the floor timestamp `t*`
//! 3. find the first record with `ts >= t*`
//!
//! A target before every record resolves to the first record.

use std::io;

use chrono::{DateTime, Utc};
use tracing::trace;

use super::cache::FingerprintCache;
use super::error::{NavigationError, Result};
use super::lines::LineScanner;
use super::timestamp::TimestampParser;
use crate::source::{Fingerprint, LogSource, SourceId};

/// Enough of a line to read any timestamp prefix
const LINE_HEAD_BYTES: usize = 512;

/// A line carrying a timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Record {
    pub offset: u64,
    pub timestamp: DateTime<Utc>,
}

pub(crate) type ProbeCache = FingerprintCache<u64, Option<Record>>;

/// Outcome of a search: the record found, or none when nothing parses
pub(crate) type Found = Option<Record>;

pub(crate) struct DateSearch<'a> {
    source: &'a dyn LogSource,
    parser: &'a dyn TimestampParser,
    baseline: Fingerprint,
    scanner: LineScanner<'a>,
    cache: &'a mut ProbeCache,
    should_stop: &'a dyn Fn() -> bool,
    probes: u64,
}

impl<'a> DateSearch<'a> {
    pub(crate) fn new(
        source: &'a dyn LogSource,
        parser: &'a dyn TimestampParser,
        baseline: Fingerprint,
        read_buffer: usize,
        cache: &'a mut ProbeCache,
        should_stop: &'a dyn Fn() -> bool,
    ) -> Self {
        Self {
            source,
            parser,
            baseline,
            scanner: LineScanner::new(source, baseline.len, read_buffer, LINE_HEAD_BYTES),
            cache,
            should_stop,
            probes: 0,
        }
    }

    /// Number of probes that actually read from the source
    pub(crate) fn probes(&self) -> u64 {
        self.probes
    }

    fn id(&self) -> &SourceId {
        self.source.id()
    }

    fn io_error(&self, cause: io::Error) -> NavigationError {
        NavigationError::io(self.id(), cause)
    }

    /// Stops on cancellation and on any change invalidating the baseline
    pub(crate) fn checkpoint(&self) -> Result<()> {
        if (self.should_stop)() {
            return Err(NavigationError::Cancelled);
        }
        match self.source.fingerprint() {
            Ok(current) if !self.baseline.invalidated_by(&current) => Ok(()),
            Ok(_) => Err(NavigationError::SourceChanged(self.id().clone())),
            Err(e) => Err(NavigationError::vanished_or_io(self.id(), e)),
        }
    }

    /// A failed read on a source that changed underneath reports the change
    fn read_failed(&self, cause: io::Error) -> NavigationError {
        match self.checkpoint() {
            Err(changed) => changed,
            Ok(()) => self.io_error(cause),
        }
    }

    fn probe(&mut self, pos: u64) -> Result<Option<Record>> {
        if let Some(hit) = self.cache.get(&self.baseline, &pos) {
            return Ok(hit);
        }
        self.checkpoint()?;
        self.probes += 1;

        let mut start = self
            .scanner
            .line_start_at_or_after(pos)
            .map_err(|e| self.read_failed(e))?;
        let found = loop {
            let line = match self.scanner.read_line(start) {
                Ok(Some(line)) => line,
                Ok(None) => break None,
                Err(e) => return Err(self.read_failed(e)),
            };
            if let Some(timestamp) = self.parser.parse(&line.head) {
                break Some(Record {
                    offset: line.start,
                    timestamp,
                });
            }
            if (self.should_stop)() {
                return Err(NavigationError::Cancelled);
            }
            start = line.end;
        };

        trace!(source = %self.id(), pos, record = ?found, "Probed");
        self.cache.insert(self.baseline, pos, found);
        Ok(found)
    }

    /// Smallest `p` whose probe is absent or satisfies `pred`, with that probe
    fn partition_point(
        &mut self,
        pred: impl Fn(DateTime<Utc>) -> bool,
    ) -> Result<(u64, Option<Record>)> {
        let (mut lo, mut hi) = (0, self.baseline.len);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.probe(mid)? {
                // Every p in (mid, record.offset] probes the same record
                Some(record) if !pred(record.timestamp) => lo = record.offset + 1,
                _ => hi = mid,
            }
        }
        let record = self.probe(lo)?;
        Ok((lo, record))
    }

    /// Record with the greatest timestamp not exceeding `target`, earliest
    /// among duplicates; the first record when `target` precedes them all
    pub(crate) fn floor(&mut self, target: DateTime<Utc>) -> Result<Found> {
        let (pos, lower) = self.partition_point(|ts| ts >= target)?;
        if let Some(record) = lower {
            if record.timestamp == target || pos == 0 {
                return Ok(Some(record));
            }
        }
        if pos == 0 {
            return Ok(None);
        }

        let previous = self
            .probe(pos - 1)?
            .ok_or_else(|| NavigationError::SourceChanged(self.id().clone()))?;
        let (_, earliest) = self.partition_point(|ts| ts >= previous.timestamp)?;
        Ok(Some(earliest.unwrap_or(previous)))
    }
}
