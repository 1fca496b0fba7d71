use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SourceId;

/// Immutable resolved position inside a log source
///
/// Pointers are produced by navigation and handed to readers as the place to
/// start streaming from. Navigating again always yields a new pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogPointer {
    source: SourceId,
    offset: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<DateTime<Utc>>,
    at_end: bool,
}

impl LogPointer {
    pub fn new(source: SourceId, offset: u64, len: u64) -> Self {
        Self {
            source,
            offset,
            timestamp: None,
            at_end: offset >= len,
        }
    }

    /// Pointer at a record whose timestamp is known
    pub fn with_timestamp(source: SourceId, offset: u64, len: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..Self::new(source, offset, len)
        }
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Start of source
    pub fn is_start(&self) -> bool {
        self.offset == 0
    }

    /// Whether the pointer sat at the end of the source when it was resolved
    pub fn is_end(&self) -> bool {
        self.at_end
    }
}
