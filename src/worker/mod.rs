//! Navigation worker pool
//!
//! Date navigation may block on file I/O for a long time on large logs, so it
//! runs on a pool fed by the [`NavigationBroker`]. Workers hand each job to
//! its own Tokio task. The task waits for its source's gate and then for one
//! of the pool's scan slots: navigations against one source are serialized,
//! while a job waiting on a busy source holds neither a worker nor a slot.
//! The scan itself executes on the blocking thread pool.

pub mod broker;
pub(crate) mod runner;

pub use broker::NavigationBroker;
