//! Latest-value state with replay-on-subscribe.

use super::types::{Subscription, SubscriptionId, Watch};
use crossbeam_channel::{unbounded, Sender};
use parking_lot::{Mutex, ReentrantMutex};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, trace};

type Callback<T> = Box<dyn FnMut(&T) + Send + 'static>;

/// Subscription ids are unique across every state in the process.
static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

enum Sink<T> {
    Callback(Callback<T>),
    Channel(Sender<T>),
}

/// Internal subscriber state.
struct Subscriber<T> {
    active: AtomicBool,
    received: Arc<AtomicBool>,
    /// Held for the whole delivery, so one subscriber never sees two values
    /// at once.
    sink: Mutex<Sink<T>>,
}

impl<T: Clone> Subscriber<T> {
    fn new(sink: Sink<T>) -> Self {
        Self {
            active: AtomicBool::new(true),
            received: Arc::new(AtomicBool::new(false)),
            sink: Mutex::new(sink),
        }
    }

    /// Deliver one value. Returns false if the subscriber is gone for good.
    fn deliver(&self, id: SubscriptionId, value: &T) -> bool {
        let mut sink = self.sink.lock();
        if !self.active.load(Ordering::Acquire) {
            return true;
        }

        let delivered = match &mut *sink {
            Sink::Callback(callback) => {
                if panic::catch_unwind(AssertUnwindSafe(|| callback(value))).is_err() {
                    error!(subscription = id.0, "subscriber callback panicked");
                }
                true
            }
            Sink::Channel(sender) => sender.send(value.clone()).is_ok(),
        };

        if delivered {
            self.received.store(true, Ordering::Release);
        }
        delivered
    }
}

struct Inner<T> {
    current: Option<T>,
    version: u64,
    subscribers: HashMap<SubscriptionId, Arc<Subscriber<T>>>,
}

struct Shared<T> {
    /// Orders publishes against each other and against subscribe-with-replay.
    order: ReentrantMutex<()>,
    inner: Mutex<Inner<T>>,
}

/// A value that pushes every change to its subscribers.
///
/// New subscribers immediately receive the current value, if one has been
/// published, then every later publish exactly once and in order. Clones
/// share the same value and subscriber set.
///
/// Callbacks run on the publishing thread. A callback must not publish into
/// the state it is subscribed to; use [`ObservableState::watch`] to hand
/// values to another thread.
pub struct ObservableState<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for ObservableState<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + 'static> ObservableState<T> {
    /// A state with no value yet.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                order: ReentrantMutex::new(()),
                inner: Mutex::new(Inner {
                    current: None,
                    version: 0,
                    subscribers: HashMap::new(),
                }),
            }),
        }
    }

    /// A state that starts out holding `value`.
    pub fn with_value(value: T) -> Self {
        let state = Self::new();
        state.publish(value);
        state
    }

    /// Replace the current value and deliver it to every subscriber.
    pub fn publish(&self, value: T) {
        let _order = self.shared.order.lock();

        let targets: Vec<_> = {
            let mut inner = self.shared.inner.lock();
            inner.current = Some(value.clone());
            inner.version += 1;
            inner
                .subscribers
                .iter()
                .map(|(id, sub)| (*id, Arc::clone(sub)))
                .collect()
        };

        let mut gone = Vec::new();
        for (id, subscriber) in targets {
            if !subscriber.deliver(id, &value) {
                gone.push(id);
            }
        }

        // Remove watchers whose receiver was dropped
        if !gone.is_empty() {
            let mut inner = self.shared.inner.lock();
            for id in gone {
                trace!(subscription = id.0, "dropping disconnected watcher");
                inner.subscribers.remove(&id);
            }
        }
    }

    /// Register a callback, replaying the current value to it first.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&T) + Send + 'static,
    {
        self.register(Sink::Callback(Box::new(callback)))
    }

    /// Register a channel-backed subscriber, replaying the current value.
    pub fn watch(&self) -> Watch<T> {
        let (sender, receiver) = unbounded();
        let subscription = self.register(Sink::Channel(sender));
        Watch {
            subscription,
            receiver,
        }
    }

    /// Stop deliveries to `subscription`. Calling it again is a no-op.
    ///
    /// A delivery already in progress on another thread runs to completion.
    pub fn unsubscribe(&self, subscription: &Subscription) {
        let removed = self.shared.inner.lock().subscribers.remove(&subscription.id);
        if let Some(subscriber) = removed {
            subscriber.active.store(false, Ordering::Release);
        }
    }

    /// The latest published value, or `None` if nothing was published yet.
    pub fn get(&self) -> Option<T> {
        self.shared.inner.lock().current.clone()
    }

    /// Number of publishes so far.
    pub fn version(&self) -> u64 {
        self.shared.inner.lock().version
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.inner.lock().subscribers.len()
    }

    fn register(&self, sink: Sink<T>) -> Subscription {
        // No publish may slip between registration and replay.
        let _order = self.shared.order.lock();

        let id = SubscriptionId(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::SeqCst));
        let subscriber = Arc::new(Subscriber::new(sink));
        let replay = {
            let mut inner = self.shared.inner.lock();
            inner.subscribers.insert(id, Arc::clone(&subscriber));
            inner.current.clone()
        };

        if let Some(value) = replay {
            if !subscriber.deliver(id, &value) {
                self.shared.inner.lock().subscribers.remove(&id);
            }
        }

        Subscription {
            id,
            received: Arc::clone(&subscriber.received),
        }
    }
}

impl<T: Clone + Send + 'static> Default for ObservableState<T> {
    fn default() -> Self {
        Self::new()
    }
}
