//! Navigation strategies
//!
//! A [`Navigation`] turns a target metric into a [`NavigationFuture`] that
//! settles to a [`LogPointer`](crate::source::LogPointer). Two metrics exist:
//!
//! - byte offsets ([`ByteOffsetNavigation`]), resolved immediately from the
//!   source length, clamped to the end for tailing
//! - timestamps ([`DateOffsetNavigation`]), resolved on the worker pool by a
//!   binary search over line timestamps
//!
//! Every outcome is delivered through the future. Strategies never panic or
//! return errors past it, and an empty source settles as
//! [`Resolution::Empty`] rather than as an error.
//!
//! ```rust,ignore
//! use lognav::navigation::{Navigation, NavigationTarget};
//!
//! let nav = factory.date_navigation(&source_id)?;
//! let resolution = nav.absolute(timestamp).wait_for(timeout).await?;
//! ```

pub mod byte;
mod cache;
pub mod date;
pub mod error;
pub mod future;
pub(crate) mod lines;
mod search;
pub mod timestamp;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use byte::ByteOffsetNavigation;
pub use date::DateOffsetNavigation;
pub use error::{NavigationError, Result};
pub use future::{NavigationFuture, Resolution};
pub use timestamp::{PatternParser, Rfc3339Parser, TimestampParser};

/// Kinds of navigation a source may support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationType {
    Byte,
    Date,
}

/// Type-erased navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationTarget {
    Byte(u64),
    Date(DateTime<Utc>),
}

impl NavigationTarget {
    pub fn navigation_type(&self) -> NavigationType {
        match self {
            NavigationTarget::Byte(_) => NavigationType::Byte,
            NavigationTarget::Date(_) => NavigationType::Date,
        }
    }
}

impl From<u64> for NavigationTarget {
    fn from(offset: u64) -> Self {
        NavigationTarget::Byte(offset)
    }
}

impl From<DateTime<Utc>> for NavigationTarget {
    fn from(timestamp: DateTime<Utc>) -> Self {
        NavigationTarget::Date(timestamp)
    }
}

/// Strategy for navigating in one log source
///
/// `M` is the metric used for absolute navigation.
pub trait Navigation<M>: Send + Sync {
    fn navigation_type(&self) -> NavigationType;

    /// Navigates absolutely to `offset`
    ///
    /// Returns at once; the future settles when the position is resolved.
    fn absolute(&self, offset: M) -> NavigationFuture;
}
