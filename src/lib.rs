//! # Recall
//!
//! Client-side access to a shared message store, built around three pieces:
//!
//! - **Sequential executor**: every store call runs as a task on one worker,
//!   in submission order, so the store is never accessed concurrently
//! - **Anti-repeat selector**: picks a random message, never the same one
//!   twice in a row unless only one exists
//! - **Observable state**: latest-value holders that replay to new
//!   subscribers and push every change exactly once
//!
//! The store itself is external and reached through the [`MessageStore`]
//! contract; [`MemoryStore`] implements it in-process.
//!
//! ## Example
//!
//! ```ignore
//! use recall::{FeedConfig, MemoryStore, MessageFeed, RecordId};
//!
//! let store = MemoryStore::new();
//! store.insert("Simplicity is prerequisite for reliability.", "Dijkstra")?;
//!
//! let feed = MessageFeed::spawn(store, FeedConfig::default())?;
//! let message = feed.observe_random_message().watch();
//!
//! feed.request_new_random_message()?;
//! println!("{:?}", message.recv()?);
//!
//! feed.set_favorite(RecordId(1), true)?;
//! feed.shutdown();
//! ```

pub mod error;
pub mod executor;
pub mod feed;
pub mod observable;
pub mod selector;
pub mod store;
pub mod types;

// Re-exports
pub use error::{FeedError, Result};
pub use executor::{InlineExecutor, SequentialExecutor, Task, TaskHandle, TaskStatus, WorkerThread};
pub use feed::{FeedConfig, FeedWorker, MessageFeed, DEFAULT_WORKER_NAME};
pub use observable::{ObservableState, Subscription, SubscriptionId, Watch};
pub use selector::{pick_avoiding, AntiRepeatSelector, SelectorState};
pub use store::{columns, FavoriteUpdate, MemoryStore, MessageStore, Selection, StoreGateway};
pub use types::*;
