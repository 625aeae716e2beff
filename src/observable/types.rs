//! Subscription types for observable state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Process-wide unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Ties one subscriber to an [`crate::ObservableState`].
///
/// Dropping a `Subscription` does not unsubscribe; pass it to
/// [`crate::ObservableState::unsubscribe`].
#[derive(Clone, Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub(crate) received: Arc<AtomicBool>,
}

impl Subscription {
    /// Whether at least one value (replayed or published) has been delivered.
    pub fn has_received(&self) -> bool {
        self.received.load(Ordering::Acquire)
    }
}

/// Channel-backed subscriber for consuming values on another thread.
pub struct Watch<T> {
    pub subscription: Subscription,
    /// Channel to receive values.
    pub receiver: crossbeam_channel::Receiver<T>,
}

impl<T> Watch<T> {
    /// Receive the next value (blocking).
    pub fn recv(&self) -> Result<T, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a value (non-blocking).
    pub fn try_recv(&self) -> Result<T, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything pending and return the newest value, if any.
    pub fn latest(&self) -> Option<T> {
        self.receiver.try_iter().last()
    }

    /// Number of values waiting to be received.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}
