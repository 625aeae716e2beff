//! Observable latest-value state.
//!
//! An [`ObservableState`] holds the most recent value of something the
//! presentation layer displays (the current random message, the favorites
//! list) and pushes every change to its subscribers:
//! - a new subscriber receives the current value immediately, if any
//! - every later publish reaches every subscriber exactly once, in order
//! - deliveries to one subscriber never overlap
//!
//! Subscribers are either callbacks, run on the publishing thread, or
//! [`Watch`] channels drained from any thread.
//!
//! # Example
//!
//! ```ignore
//! let favorites = ObservableState::<Vec<Record>>::new();
//! let watch = favorites.watch();
//!
//! favorites.publish(vec![]);
//! assert_eq!(watch.recv()?, vec![]);
//! ```

mod state;
mod types;

pub use state::ObservableState;
pub use types::{Subscription, SubscriptionId, Watch};
