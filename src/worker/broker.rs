use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use super::runner::{NavigationJob, run_worker};
use crate::navigation::NavigationError;
use crate::observability::Metrics;

/// Distributes navigation jobs across the worker pool
///
/// Architecture:
/// 1. A navigation calls `broker.submit(job)` from the caller's thread
/// 2. The job takes one unit of pool capacity (`workers * channel_size`);
///    with none left it is rejected with `Overloaded`
/// 3. The job goes round-robin to a worker's bounded channel, and a full
///    channel hands it to the next worker
/// 4. The worker starts a task per job; the task waits for its source's
///    gate, then for one of `workers` scan slots
///
/// Submission never blocks, so `absolute()` can always return its future
/// immediately.
pub struct NavigationBroker {
    worker_channels: Vec<mpsc::Sender<NavigationJob>>,
    next_worker: AtomicUsize,
    capacity: Arc<Semaphore>,
    slots: Arc<Semaphore>,
    metrics: Arc<Metrics>,
}

impl NavigationBroker {
    /// Creates the broker and one receiver per worker
    pub(crate) fn new(
        num_workers: usize,
        channel_size: usize,
        metrics: Arc<Metrics>,
    ) -> (Self, Vec<mpsc::Receiver<NavigationJob>>) {
        let num_workers = num_workers.max(1);
        let channel_size = channel_size.max(1);
        info!(num_workers, channel_size, "Creating NavigationBroker with worker channels");

        let mut worker_channels = Vec::with_capacity(num_workers);
        let mut worker_receivers = Vec::with_capacity(num_workers);
        for worker_id in 0..num_workers {
            let (tx, rx) = mpsc::channel(channel_size);
            worker_channels.push(tx);
            worker_receivers.push(rx);
            debug!(worker_id, "Created worker channel");
        }

        let broker = Self {
            worker_channels,
            next_worker: AtomicUsize::new(0),
            capacity: Arc::new(Semaphore::new(num_workers * channel_size)),
            slots: Arc::new(Semaphore::new(num_workers)),
            metrics,
        };
        (broker, worker_receivers)
    }

    /// Creates the broker and spawns its workers on the current runtime
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    pub fn spawn(num_workers: usize, channel_size: usize, metrics: Arc<Metrics>) -> Arc<Self> {
        let (broker, receivers) = Self::new(num_workers, channel_size, metrics.clone());
        for (worker_id, rx) in receivers.into_iter().enumerate() {
            tokio::spawn(run_worker(worker_id, rx, broker.slots.clone(), metrics.clone()));
        }
        Arc::new(broker)
    }

    /// Queues a job without waiting
    pub(crate) fn submit(&self, mut job: NavigationJob) {
        let Ok(permit) = self.capacity.clone().try_acquire_owned() else {
            warn!(source = %job.source_id(), "Navigation pool at capacity, navigation rejected");
            job.reject(NavigationError::Overloaded, &self.metrics);
            return;
        };
        job.admit(permit);

        let workers = self.worker_channels.len();
        let first = self.next_worker.fetch_add(1, Ordering::Relaxed) % workers;

        let mut closed = 0;
        for attempt in 0..workers {
            let worker_idx = (first + attempt) % workers;
            match self.worker_channels[worker_idx].try_send(job) {
                Ok(()) => {
                    debug!(worker_idx, "Navigation sent to worker");
                    return;
                }
                Err(TrySendError::Full(returned)) => job = returned,
                Err(TrySendError::Closed(returned)) => {
                    closed += 1;
                    job = returned;
                }
            }
        }

        if closed == workers {
            warn!(source = %job.source_id(), "All worker channels closed, navigation dropped");
            job.reject(NavigationError::WorkerLost, &self.metrics);
        } else {
            warn!(source = %job.source_id(), "All worker channels full, navigation rejected");
            job.reject(NavigationError::Overloaded, &self.metrics);
        }
    }

    pub fn num_workers(&self) -> usize {
        self.worker_channels.len()
    }

    /// Check if all worker channels are healthy (not closed)
    pub fn health_check(&self) -> bool {
        self.worker_channels.iter().all(|ch| !ch.is_closed())
    }
}
