//! Executor backed by one dedicated thread.

use super::task::{run_job, Job, Task, TaskHandle};
use super::SequentialExecutor;
use crate::error::{FeedError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle, ThreadId};
use tracing::{debug, warn};

/// Runs tasks on a single named thread that owns the context.
///
/// The thread lives until [`SequentialExecutor::shutdown`] or until the
/// executor is dropped, at which point the remaining queue is drained.
pub struct WorkerThread<C> {
    name: String,
    /// Taken on shutdown; dropping it lets the worker drain and exit.
    sender: Mutex<Option<Sender<Job<C>>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    worker: ThreadId,
    next_id: AtomicU64,
}

impl<C: Send + 'static> WorkerThread<C> {
    /// Spawn the worker, moving `context` onto it.
    pub fn spawn(name: impl Into<String>, context: C) -> Result<Self> {
        let name = name.into();
        let (sender, receiver) = unbounded::<Job<C>>();

        let thread_name = name.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || worker_loop(thread_name, context, receiver))?;
        let worker = handle.thread().id();

        debug!(worker = %name, "worker thread started");

        Ok(Self {
            name,
            sender: Mutex::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
            worker,
            next_id: AtomicU64::new(1),
        })
    }

    /// True when called from inside a task on this worker.
    pub fn is_worker_thread(&self) -> bool {
        thread::current().id() == self.worker
    }
}

impl<C: Send + 'static> SequentialExecutor<C> for WorkerThread<C> {
    fn submit(&self, task: Task<C>) -> Result<TaskHandle> {
        let sender = self.sender.lock();
        let sender = sender.as_ref().ok_or(FeedError::ExecutorShutDown)?;

        let handle = TaskHandle::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        sender
            .send(Job {
                task,
                handle: handle.clone(),
            })
            .map_err(|_| FeedError::ExecutorShutDown)?;
        Ok(handle)
    }

    fn shutdown(&self) {
        if self.sender.lock().take().is_none() {
            return;
        }
        debug!(worker = %self.name, "worker shutting down");

        // A task cannot wait for its own thread; the worker exits on its own
        // once the queue is empty.
        if self.is_worker_thread() {
            return;
        }
        if let Some(handle) = self.handle.lock().take() {
            if handle.join().is_err() {
                warn!(worker = %self.name, "worker thread panicked outside a task");
            }
        }
    }

    fn is_shut_down(&self) -> bool {
        self.sender.lock().is_none()
    }
}

fn worker_loop<C>(name: String, mut context: C, receiver: Receiver<Job<C>>) {
    for job in receiver.iter() {
        run_job(&mut context, job);
    }
    debug!(worker = %name, "worker queue drained, exiting");
}
