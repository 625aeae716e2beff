//! Tasks, their handles and the shared run step.

use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, trace};

/// A unit of work run against the executor's context.
pub type Task<C> = Box<dyn FnOnce(&mut C) + Send + 'static>;

/// Lifecycle of a submitted task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    /// Waiting in the queue.
    Queued,
    /// Currently running on the executor.
    Running,
    /// Returned normally.
    Completed,
    /// Panicked; the executor carried on.
    Panicked,
    /// Cancelled before it started.
    Cancelled,
}

impl TaskStatus {
    /// True once the task will never change state again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Panicked | TaskStatus::Cancelled
        )
    }
}

struct TaskState {
    id: u64,
    status: Mutex<TaskStatus>,
    changed: Condvar,
}

/// Handle to a submitted task.
///
/// Dropping the handle does not cancel the task.
#[derive(Clone)]
pub struct TaskHandle {
    state: Arc<TaskState>,
}

impl TaskHandle {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            state: Arc::new(TaskState {
                id,
                status: Mutex::new(TaskStatus::Queued),
                changed: Condvar::new(),
            }),
        }
    }

    /// Executor-local task number, increasing in submission order.
    pub fn id(&self) -> u64 {
        self.state.id
    }

    pub fn status(&self) -> TaskStatus {
        *self.state.status.lock()
    }

    /// Request cancellation.
    ///
    /// Succeeds only while the task is still queued; a running task is never
    /// interrupted. Returns whether the task will be skipped.
    pub fn cancel(&self) -> bool {
        let mut status = self.state.status.lock();
        if *status == TaskStatus::Queued {
            *status = TaskStatus::Cancelled;
            self.state.changed.notify_all();
            true
        } else {
            false
        }
    }

    /// Block until the task reaches a terminal status or `timeout` elapses.
    ///
    /// Returns the status observed last.
    pub fn wait_timeout(&self, timeout: Duration) -> TaskStatus {
        let deadline = Instant::now() + timeout;
        let mut status = self.state.status.lock();
        while !status.is_terminal() {
            if self.state.changed.wait_until(&mut status, deadline).timed_out() {
                break;
            }
        }
        *status
    }

    /// Move Queued -> Running. False if the task was cancelled.
    fn begin(&self) -> bool {
        let mut status = self.state.status.lock();
        if *status == TaskStatus::Queued {
            *status = TaskStatus::Running;
            true
        } else {
            false
        }
    }

    fn finish(&self, outcome: TaskStatus) {
        *self.state.status.lock() = outcome;
        self.state.changed.notify_all();
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id())
            .field("status", &self.status())
            .finish()
    }
}

/// A queued task together with its handle.
pub(crate) struct Job<C> {
    pub(crate) task: Task<C>,
    pub(crate) handle: TaskHandle,
}

/// Run one job against the context, containing any panic.
pub(crate) fn run_job<C>(context: &mut C, job: Job<C>) {
    let Job { task, handle } = job;
    if !handle.begin() {
        trace!(task = handle.id(), "skipping cancelled task");
        return;
    }

    match panic::catch_unwind(AssertUnwindSafe(|| task(context))) {
        Ok(()) => handle.finish(TaskStatus::Completed),
        Err(payload) => {
            error!(
                task = handle.id(),
                panic = %panic_message(payload.as_ref()),
                "task panicked, continuing with next task"
            );
            handle.finish(TaskStatus::Panicked);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
