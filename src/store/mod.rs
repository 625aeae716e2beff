//! Access to the external message store.
//!
//! The store itself is a collaborator this crate does not own. It is reached
//! through the [`MessageStore`] query/update contract, and [`StoreGateway`]
//! turns that contract into the three operations the feed needs:
//! - fetch every record
//! - fetch favorites
//! - set the favorite flag of one record
//!
//! [`MemoryStore`] is an in-process implementation of the contract, used by
//! tests, benches and headless embeddings.

mod contract;
mod gateway;
mod memory;

pub use contract::{columns, FavoriteUpdate, MessageStore, Selection};
pub use gateway::StoreGateway;
pub use memory::MemoryStore;
