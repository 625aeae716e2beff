//! Sequential task execution.
//!
//! Every store access runs as a task on a single executor, so the store is
//! never touched from two places at once. Tasks:
//! - run in submission order, one at a time
//! - receive `&mut C`, a context owned by the executor
//! - may panic without stopping the executor
//!
//! Two implementations are provided: [`WorkerThread`] drains the queue on a
//! dedicated thread, [`InlineExecutor`] drains it on the submitting thread
//! before `submit` returns (for headless, deterministic tests).
//!
//! # Example
//!
//! ```ignore
//! let executor = WorkerThread::spawn("counter", 0u64)?;
//! let handle = executor.submit(Box::new(|count: &mut u64| *count += 1))?;
//! handle.wait_timeout(Duration::from_secs(1));
//! executor.shutdown();
//! ```

mod inline;
mod task;
mod worker;

pub use inline::InlineExecutor;
pub use task::{Task, TaskHandle, TaskStatus};
pub use worker::WorkerThread;

use crate::error::Result;

/// A FIFO queue of tasks drained by exactly one consumer.
pub trait SequentialExecutor<C>: Send + Sync {
    /// Enqueue a task without waiting for it to run.
    ///
    /// Fails with [`crate::FeedError::ExecutorShutDown`] after
    /// [`SequentialExecutor::shutdown`].
    fn submit(&self, task: Task<C>) -> Result<TaskHandle>;

    /// Reject further submissions, run what is already queued, then stop.
    fn shutdown(&self);

    /// Whether [`SequentialExecutor::shutdown`] has been called.
    fn is_shut_down(&self) -> bool;
}
