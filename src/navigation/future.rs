//! Deferred navigation results
//!
//! A [`NavigationFuture`] is created when a navigation request is accepted and
//! settles exactly once. The producing side is a [`Settler`], consumed by
//! [`Settler::settle`]; a settler dropped without settling (worker panic,
//! shutdown) surfaces as [`NavigationError::WorkerLost`].
//!
//! Cancellation is cooperative: [`NavigationFuture::cancel`] raises a flag and
//! dropping the handle closes the channel. Running work polls
//! [`Settler::should_stop`] between reads and stops there.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;
use uuid::Uuid;

use super::error::{NavigationError, Result};
use crate::source::LogPointer;

/// Successful navigation outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Position resolved
    Pointer(LogPointer),
    /// The source has no content yet
    Empty,
}

impl Resolution {
    pub fn pointer(&self) -> Option<&LogPointer> {
        match self {
            Resolution::Pointer(pointer) => Some(pointer),
            Resolution::Empty => None,
        }
    }

    pub fn into_pointer(self) -> Option<LogPointer> {
        match self {
            Resolution::Pointer(pointer) => Some(pointer),
            Resolution::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Resolution::Empty)
    }
}

type Settlement = Result<Resolution>;

/// Single-consumer handle on an in-flight navigation
///
/// Await it directly, or use [`wait_for`](Self::wait_for) to bound the wait.
/// A timed out wait leaves the handle usable. Once the outcome has been
/// produced, further polls return [`NavigationError::AlreadyConsumed`].
#[must_use = "navigation work is cancelled when the future is dropped"]
pub struct NavigationFuture {
    request_id: Uuid,
    /// `None` once the outcome has been handed out
    rx: Option<oneshot::Receiver<Settlement>>,
    cancelled: Arc<AtomicBool>,
}

/// Producer half of a [`NavigationFuture`]
pub(crate) struct Settler {
    request_id: Uuid,
    tx: oneshot::Sender<Settlement>,
    cancelled: Arc<AtomicBool>,
}

/// Creates a connected settler/future pair
pub(crate) fn pending() -> (Settler, NavigationFuture) {
    let (tx, rx) = oneshot::channel();
    let cancelled = Arc::new(AtomicBool::new(false));
    let request_id = Uuid::now_v7();

    let settler = Settler {
        request_id,
        tx,
        cancelled: cancelled.clone(),
    };
    let future = NavigationFuture {
        request_id,
        rx: Some(rx),
        cancelled,
    };
    (settler, future)
}

impl NavigationFuture {
    /// Future that is already settled
    pub fn ready(settlement: Settlement) -> Self {
        let (settler, future) = pending();
        settler.settle(settlement);
        future
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Asks the running work to stop at its next checkpoint
    ///
    /// Work that already finished keeps its outcome.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Waits at most `timeout` for the outcome
    pub async fn wait_for(&mut self, timeout: Duration) -> Settlement {
        match tokio::time::timeout(timeout, &mut *self).await {
            Ok(settlement) => settlement,
            Err(_) => Err(NavigationError::Timeout(timeout)),
        }
    }

    /// Blocking variant of [`wait_for`](Self::wait_for) for synchronous callers
    ///
    /// Must be called outside of any Tokio runtime; the navigation work itself
    /// keeps running on the pool that accepted it.
    pub fn blocking_wait_for(&mut self, timeout: Duration) -> Settlement {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(NavigationError::Runtime(io::Error::other(
                "blocking wait called from within an async runtime",
            )));
        }

        // Dedicated runtime: the caller is not inside a Tokio runtime.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(NavigationError::Runtime)?;
        runtime.block_on(self.wait_for(timeout))
    }
}

impl Future for NavigationFuture {
    type Output = Settlement;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(rx) = self.rx.as_mut() else {
            return Poll::Ready(Err(NavigationError::AlreadyConsumed));
        };
        let received = std::task::ready!(Pin::new(rx).poll(cx));
        self.rx = None;
        Poll::Ready(received.unwrap_or(Err(NavigationError::WorkerLost)))
    }
}

impl std::fmt::Debug for NavigationFuture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationFuture")
            .field("request_id", &self.request_id)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl Settler {
    pub(crate) fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// True once the consumer cancelled or dropped its handle
    pub(crate) fn should_stop(&self) -> bool {
        self.cancelled.load(Ordering::Acquire) || self.tx.is_closed()
    }

    /// Delivers the outcome; returns false when nobody is listening anymore
    pub(crate) fn settle(self, settlement: Settlement) -> bool {
        self.tx.send(settlement).is_ok()
    }
}
