use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::source::SourceId;

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("I/O error on source '{source_id}': {cause}")]
    Io {
        source_id: SourceId,
        #[source]
        cause: io::Error,
    },

    #[error("Source '{0}' was truncated or rotated during navigation")]
    SourceChanged(SourceId),

    #[error("Navigation not settled within {0:?}")]
    Timeout(Duration),

    #[error("Navigation cancelled")]
    Cancelled,

    #[error("Unknown source: {0}")]
    UnknownSource(SourceId),

    #[error("Source '{0}' has no timestamp parser, date navigation unavailable")]
    DateNavigationUnsupported(SourceId),

    #[error("All navigation workers are busy")]
    Overloaded,

    #[error("Navigation worker stopped before settling the request")]
    WorkerLost,

    #[error("Runtime error while waiting: {0}")]
    Runtime(#[source] io::Error),

    #[error("Navigation outcome was already taken")]
    AlreadyConsumed,
}

impl NavigationError {
    pub(crate) fn io(source_id: &SourceId, cause: io::Error) -> Self {
        NavigationError::Io {
            source_id: source_id.clone(),
            cause,
        }
    }

    /// Like [`NavigationError::io`], but a source that no longer exists has
    /// changed rather than failed
    pub(crate) fn vanished_or_io(source_id: &SourceId, cause: io::Error) -> Self {
        if cause.kind() == io::ErrorKind::NotFound {
            NavigationError::SourceChanged(source_id.clone())
        } else {
            NavigationError::io(source_id, cause)
        }
    }

    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            NavigationError::Timeout(_)
                | NavigationError::Overloaded
                | NavigationError::SourceChanged(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, NavigationError>;
