//! Typed operations over the store contract.

use super::contract::{FavoriteUpdate, MessageStore, Selection};
use crate::error::Result;
use crate::types::{Record, RecordId};
use tracing::{debug, warn};

/// Translates feed operations into store queries and updates.
///
/// Store failures stop here: fetches degrade to an empty list and updates to
/// zero affected rows, with the cause logged. A row that does not decode is
/// logged and left out; the rest of the result still comes through.
pub struct StoreGateway<S> {
    store: S,
}

impl<S: MessageStore> StoreGateway<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Every record in the store, in store order.
    pub fn fetch_all(&self) -> Vec<Record> {
        self.fetch(Selection::All)
    }

    /// Records currently marked as favorite.
    pub fn fetch_favorites(&self) -> Vec<Record> {
        self.fetch(Selection::Favorite(true))
    }

    /// Set the favorite flag of one record.
    ///
    /// Returns the number of affected rows: 1 on success, 0 if `id` does not
    /// exist or the store could not be reached.
    pub fn set_favorite(&mut self, id: RecordId, favorite: bool) -> usize {
        match self.store.update(id, FavoriteUpdate { favorite }) {
            Ok(0) => {
                debug!(id = id.0, "favorite update matched no record");
                0
            }
            Ok(1) => 1,
            Ok(affected) => {
                warn!(id = id.0, affected, "favorite update touched more than one row");
                affected
            }
            Err(e) => {
                warn!(id = id.0, error = %e, "favorite update failed");
                0
            }
        }
    }

    fn fetch(&self, selection: Selection) -> Vec<Record> {
        match self.try_fetch(selection) {
            Ok(records) => records,
            Err(e) => {
                warn!(?selection, error = %e, "store query failed, returning no records");
                Vec::new()
            }
        }
    }

    fn try_fetch(&self, selection: Selection) -> Result<Vec<Record>> {
        let rows = self.store.query(selection)?;
        let records = rows
            .iter()
            .filter_map(|row| match Record::from_row(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(?selection, error = %e, "skipping malformed row");
                    None
                }
            })
            .collect();
        Ok(records)
    }
}
