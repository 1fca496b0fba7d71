//! Log sources and the positions resolved inside them
//!
//! A source is anything that can report its current length and identity and
//! serve positioned reads. Navigation never holds more than one read buffer of
//! a source in memory, so sources may be arbitrarily large.
//!
//! ## Change detection
//!
//! Every navigation captures a [`Fingerprint`] when it starts and compares it
//! against fresh fingerprints at its checkpoints. A source whose identity
//! changed (rotation) or whose length shrank (truncation) is reported as
//! changed. Growth is expected for live logs and is not a change.
pub mod file;
pub mod memory;
pub mod pointer;

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};

pub use file::FileSource;
pub use memory::MemorySource;
pub use pointer::LogPointer;

/// Opaque identity of a registered log source
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SourceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Length and identity of a source at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// Current size in bytes
    pub len: u64,
    /// Incarnation of the source; changes when the source is replaced
    pub identity: u64,
}

impl Fingerprint {
    pub fn new(len: u64, identity: u64) -> Self {
        Self { len, identity }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when `later` cannot describe the same content this fingerprint saw
    pub fn invalidated_by(&self, later: &Fingerprint) -> bool {
        later.identity != self.identity || later.len < self.len
    }
}

/// Storage collaborator consumed by navigation
pub trait LogSource: Send + Sync + 'static {
    /// Identity under which the source is registered
    fn id(&self) -> &SourceId;

    /// Current length and identity
    ///
    /// Fails with [`io::ErrorKind::NotFound`] when the source does not exist.
    fn fingerprint(&self) -> io::Result<Fingerprint>;

    /// Reads up to `buf.len()` bytes starting at `offset`
    ///
    /// Returns 0 at or past the end of the source.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_is_not_a_change() {
        let before = Fingerprint::new(100, 7);
        assert!(!before.invalidated_by(&Fingerprint::new(100, 7)));
        assert!(!before.invalidated_by(&Fingerprint::new(250, 7)));
    }

    #[test]
    fn test_truncation_and_rotation_are_changes() {
        let before = Fingerprint::new(100, 7);
        assert!(before.invalidated_by(&Fingerprint::new(99, 7)));
        assert!(before.invalidated_by(&Fingerprint::new(100, 8)));
    }

    #[test]
    fn test_source_id_display() {
        let id = SourceId::new("app");
        assert_eq!(id.to_string(), "app");
        assert_eq!(id.as_str(), "app");
        assert_eq!(id, SourceId::from("app"));
    }
}
