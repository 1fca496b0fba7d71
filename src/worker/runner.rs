//! Navigation worker - dispatches queued navigations onto their own tasks

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore, mpsc};
use tracing::{debug, info, warn};

use crate::navigation::future::Settler;
use crate::navigation::{NavigationError, Resolution};
use crate::observability::Metrics;
use crate::source::SourceId;

/// Blocking navigation body; polls the settler for cancellation
pub(crate) type Work = Box<dyn FnOnce(&Settler) -> Result<Resolution, NavigationError> + Send>;

/// Queued navigation request
pub(crate) struct NavigationJob {
    source_id: SourceId,
    /// Held for the whole blocking scan: one active reader per source
    gate: Arc<Mutex<()>>,
    settler: Settler,
    work: Work,
    /// Broker capacity taken by this job until it settles
    admission: Option<OwnedSemaphorePermit>,
}

impl NavigationJob {
    pub(crate) fn new(source_id: SourceId, gate: Arc<Mutex<()>>, settler: Settler, work: Work) -> Self {
        Self {
            source_id,
            gate,
            settler,
            work,
            admission: None,
        }
    }

    pub(crate) fn source_id(&self) -> &SourceId {
        &self.source_id
    }

    pub(crate) fn admit(&mut self, permit: OwnedSemaphorePermit) {
        self.admission = Some(permit);
    }

    /// Settles without running
    pub(crate) fn reject(self, error: NavigationError, metrics: &Metrics) {
        let NavigationJob { settler, admission, .. } = self;
        drop(admission);
        let outcome = Err(error);
        metrics.record(&outcome);
        settler.settle(outcome);
    }

    /// Waits for the source gate, then for a free slot, then scans
    ///
    /// The slot is only requested once the gate is held, so a job queued
    /// behind a busy source never occupies capacity other sources could use.
    pub(crate) async fn run(self, worker_id: usize, slots: Arc<Semaphore>, metrics: Arc<Metrics>) {
        let NavigationJob {
            source_id,
            gate,
            settler,
            work,
            admission,
        } = self;
        let request_id = settler.request_id();

        if settler.should_stop() {
            debug!(worker_id, %request_id, source = %source_id, "Skipping abandoned navigation");
            drop(admission);
            abandon(settler, &metrics);
            return;
        }

        let _guard = gate.lock_owned().await;
        if settler.should_stop() {
            debug!(worker_id, %request_id, source = %source_id, "Navigation abandoned while waiting for its source");
            drop(admission);
            abandon(settler, &metrics);
            return;
        }

        let Ok(_slot) = slots.acquire_owned().await else {
            warn!(worker_id, %request_id, source = %source_id, "Worker pool closed");
            drop(admission);
            let outcome = Err(NavigationError::WorkerLost);
            metrics.record(&outcome);
            settler.settle(outcome);
            return;
        };
        debug!(worker_id, %request_id, source = %source_id, "Navigation started");

        let task_metrics = metrics.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let outcome = work(&settler);
            task_metrics.record(&outcome);
            // Capacity is returned before the consumer can observe the outcome
            drop(admission);
            if !settler.settle(outcome) {
                debug!(%request_id, "Navigation settled after consumer left");
            }
        })
        .await;

        // A panicking body drops its settler, which the consumer sees as WorkerLost
        if let Err(e) = joined {
            warn!(worker_id, %request_id, source = %source_id, error = %e, "Navigation task failed");
            metrics.record(&Err(NavigationError::WorkerLost));
        }
    }
}

fn abandon(settler: Settler, metrics: &Metrics) {
    let outcome = Err(NavigationError::Cancelled);
    metrics.record(&outcome);
    settler.settle(outcome);
}

/// Worker loop: hands every received job to its own task until all senders
/// are gone
///
/// `slots` is shared by the whole pool and bounds how many scans run at once.
pub(crate) async fn run_worker(
    worker_id: usize,
    mut rx: mpsc::Receiver<NavigationJob>,
    slots: Arc<Semaphore>,
    metrics: Arc<Metrics>,
) {
    info!(worker_id, "Navigation worker started");
    while let Some(job) = rx.recv().await {
        tokio::spawn(job.run(worker_id, slots.clone(), metrics.clone()));
    }
    info!(worker_id, "Navigation worker stopped");
}
