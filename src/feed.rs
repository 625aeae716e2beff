//! Presentation-facing message feed.
//!
//! [`MessageFeed`] is what a UI talks to. Every request becomes a task on
//! the feed's executor; results come back through two observable states,
//! one for the current random message and one for the favorites list.

use crate::error::Result;
use crate::executor::{InlineExecutor, SequentialExecutor, TaskHandle, WorkerThread};
use crate::observable::ObservableState;
use crate::selector::AntiRepeatSelector;
use crate::store::{MessageStore, StoreGateway};
use crate::types::{Record, RecordId};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Default name of the feed's worker thread.
pub const DEFAULT_WORKER_NAME: &str = "recall-worker";

/// Feed configuration.
#[derive(Clone, Debug)]
pub struct FeedConfig {
    /// Name given to the worker thread.
    pub worker_name: String,

    /// Request a random message and a favorites refresh at construction.
    pub load_on_start: bool,

    /// Seed for the selector's generator (None = seeded from entropy).
    pub seed: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            load_on_start: false,
            seed: None,
        }
    }
}

impl FeedConfig {
    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    pub fn with_load_on_start(mut self, load: bool) -> Self {
        self.load_on_start = load;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Everything that lives on the executor: the store, the selector state and
/// the publishing side of both observables.
pub struct FeedWorker<S> {
    gateway: StoreGateway<S>,
    selector: AntiRepeatSelector,
    random_message: ObservableState<Option<Record>>,
    favorites: ObservableState<Vec<Record>>,
}

impl<S: MessageStore> FeedWorker<S> {
    fn new(store: S, config: &FeedConfig) -> Self {
        let selector = match config.seed {
            Some(seed) => AntiRepeatSelector::seeded(seed),
            None => AntiRepeatSelector::new(),
        };

        Self {
            gateway: StoreGateway::new(store),
            selector,
            random_message: ObservableState::new(),
            favorites: ObservableState::new(),
        }
    }

    /// Fetch all messages, pick one that differs from the last pick, publish
    /// it. Publishes `None` when the store has no messages.
    pub fn load_random_message(&mut self) {
        let candidates = self.gateway.fetch_all();
        let picked = self.selector.pick(&candidates).cloned();

        match &picked {
            Some(record) => trace!(id = record.id.0, candidates = candidates.len(), "picked message"),
            None => debug!("no messages to pick from"),
        }
        self.random_message.publish(picked);
    }

    /// Fetch and publish the favorites list.
    pub fn load_favorites(&mut self) {
        let favorites = self.gateway.fetch_favorites();
        trace!(count = favorites.len(), "favorites loaded");
        self.favorites.publish(favorites);
    }

    /// Write the favorite flag, returning the affected row count.
    pub fn update_favorite(&mut self, id: RecordId, favorite: bool) -> usize {
        self.gateway.set_favorite(id, favorite)
    }
}

/// Serialized, observable access to a message store.
pub struct MessageFeed<S: MessageStore> {
    executor: Arc<dyn SequentialExecutor<FeedWorker<S>>>,
    random_message: ObservableState<Option<Record>>,
    favorites: ObservableState<Vec<Record>>,
}

impl<S: MessageStore> MessageFeed<S> {
    /// Start a feed whose store calls run on a dedicated worker thread.
    pub fn spawn(store: S, config: FeedConfig) -> Result<Self> {
        let worker = FeedWorker::new(store, &config);
        let random_message = worker.random_message.clone();
        let favorites = worker.favorites.clone();

        let executor = WorkerThread::spawn(config.worker_name.clone(), worker)?;
        Ok(Self::assemble(
            Arc::new(executor),
            random_message,
            favorites,
            &config,
        ))
    }

    /// Start a feed that runs every request on the calling thread before
    /// returning.
    pub fn inline(store: S, config: FeedConfig) -> Self {
        let worker = FeedWorker::new(store, &config);
        let random_message = worker.random_message.clone();
        let favorites = worker.favorites.clone();

        Self::assemble(
            Arc::new(InlineExecutor::new(worker)),
            random_message,
            favorites,
            &config,
        )
    }

    fn assemble(
        executor: Arc<dyn SequentialExecutor<FeedWorker<S>>>,
        random_message: ObservableState<Option<Record>>,
        favorites: ObservableState<Vec<Record>>,
        config: &FeedConfig,
    ) -> Self {
        let feed = Self {
            executor,
            random_message,
            favorites,
        };

        if config.load_on_start {
            debug!("loading initial feed state");
            if let Err(e) = feed.request_new_random_message() {
                warn!(error = %e, "initial random message load not scheduled");
            }
            if let Err(e) = feed.refresh_favorites() {
                warn!(error = %e, "initial favorites load not scheduled");
            }
        }
        feed
    }

    /// The current random message.
    ///
    /// `get()` returning `None` means nothing was loaded yet; `Some(None)`
    /// means the store holds no messages.
    pub fn observe_random_message(&self) -> ObservableState<Option<Record>> {
        self.random_message.clone()
    }

    /// The current favorites list.
    pub fn observe_favorites(&self) -> ObservableState<Vec<Record>> {
        self.favorites.clone()
    }

    /// Schedule a fresh anti-repeat pick.
    pub fn request_new_random_message(&self) -> Result<TaskHandle> {
        self.executor
            .submit(Box::new(|worker: &mut FeedWorker<S>| worker.load_random_message()))
    }

    /// Schedule a favorites reload.
    pub fn refresh_favorites(&self) -> Result<TaskHandle> {
        self.executor
            .submit(Box::new(|worker: &mut FeedWorker<S>| worker.load_favorites()))
    }

    /// Schedule a favorite flag update.
    ///
    /// When the update affects a row, a favorites reload is queued from
    /// inside the update task, so it always observes the new flag. If the
    /// executor was shut down meanwhile, the reload runs inside the update
    /// task instead. An update that matches nothing leaves the favorites
    /// state alone.
    pub fn set_favorite(&self, id: RecordId, favorite: bool) -> Result<TaskHandle> {
        let executor = Arc::clone(&self.executor);
        self.executor
            .submit(Box::new(move |worker: &mut FeedWorker<S>| {
                if worker.update_favorite(id, favorite) == 0 {
                    return;
                }
                let refresh = executor
                    .submit(Box::new(|worker: &mut FeedWorker<S>| worker.load_favorites()));
                if let Err(e) = refresh {
                    // Draining after shutdown: refresh in place.
                    warn!(id = id.0, error = %e, "favorites refresh not queued, loading now");
                    worker.load_favorites();
                }
            }))
    }

    /// Stop accepting requests and finish the queued ones.
    pub fn shutdown(&self) {
        self.executor.shutdown();
    }

    pub fn is_shut_down(&self) -> bool {
        self.executor.is_shut_down()
    }
}
