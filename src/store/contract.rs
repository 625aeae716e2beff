//! Query/update contract of the external message store.

use crate::error::Result;
use crate::types::{RecordId, Row};
use serde::{Deserialize, Serialize};

/// Column names shared by the store and its clients.
pub mod columns {
    /// Integer identity, assigned by the store.
    pub const ID: &str = "_id";
    pub const TEXT: &str = "text";
    pub const AUTHOR: &str = "author";
    /// 1 for favorite, 0 otherwise.
    pub const FAVORITE: &str = "favorite";
}

/// Row filter for [`MessageStore::query`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// Every row.
    All,
    /// Rows whose favorite column equals the given flag.
    Favorite(bool),
}

impl Selection {
    /// Check whether a row's favorite flag passes this filter.
    pub fn matches(&self, favorite: bool) -> bool {
        match self {
            Selection::All => true,
            Selection::Favorite(wanted) => *wanted == favorite,
        }
    }
}

/// Values written by [`MessageStore::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteUpdate {
    pub favorite: bool,
}

/// The contract a backing store must offer.
///
/// Implementations may block; they are only ever called from the feed's
/// worker, one call at a time.
pub trait MessageStore: Send + 'static {
    /// Return every row matching `selection`, in store order.
    fn query(&self, selection: Selection) -> Result<Vec<Row>>;

    /// Apply `values` to the single row with identity `id`.
    ///
    /// Returns the number of rows affected (0 when no such row exists).
    fn update(&mut self, id: RecordId, values: FavoriteUpdate) -> Result<usize>;
}

impl<S: MessageStore + ?Sized> MessageStore for Box<S> {
    fn query(&self, selection: Selection) -> Result<Vec<Row>> {
        (**self).query(selection)
    }

    fn update(&mut self, id: RecordId, values: FavoriteUpdate) -> Result<usize> {
        (**self).update(id, values)
    }
}
