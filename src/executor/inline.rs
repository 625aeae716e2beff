//! Executor that runs tasks on the submitting thread.

use super::task::{run_job, Job, Task, TaskHandle};
use super::SequentialExecutor;
use crate::error::{FeedError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Synchronous executor.
///
/// `submit` drains the queue before returning. With a single submitting
/// thread, every task submitted so far (including tasks submitted from
/// inside those tasks) has run by the time it returns. When another thread
/// is already draining, `submit` only queues the task and returns with the
/// handle still `Queued`. A task submitted while another is running is
/// queued behind it rather than run re-entrantly.
pub struct InlineExecutor<C> {
    context: Mutex<C>,
    queue: Mutex<VecDeque<Job<C>>>,
    draining: AtomicBool,
    shut_down: AtomicBool,
    next_id: AtomicU64,
}

impl<C> InlineExecutor<C> {
    pub fn new(context: C) -> Self {
        Self {
            context: Mutex::new(context),
            queue: Mutex::new(VecDeque::new()),
            draining: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        }
    }

    /// Inspect the context between tasks.
    pub fn with_context<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut self.context.lock())
    }

    fn next_job(&self) -> Option<Job<C>> {
        self.queue.lock().pop_front()
    }

    fn drain(&self) {
        loop {
            // Someone up the stack (or another thread) is already draining.
            if self.draining.swap(true, Ordering::AcqRel) {
                return;
            }

            while let Some(job) = self.next_job() {
                let mut context = self.context.lock();
                run_job(&mut *context, job);
            }

            self.draining.store(false, Ordering::Release);
            if self.queue.lock().is_empty() {
                return;
            }
        }
    }
}

impl<C: Send> SequentialExecutor<C> for InlineExecutor<C> {
    fn submit(&self, task: Task<C>) -> Result<TaskHandle> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(FeedError::ExecutorShutDown);
        }

        let handle = TaskHandle::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.queue.lock().push_back(Job {
            task,
            handle: handle.clone(),
        });
        self.drain();
        Ok(handle)
    }

    fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
        self.drain();
    }

    fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }
}
