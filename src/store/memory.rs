//! In-memory implementation of the store contract.

use super::contract::{FavoriteUpdate, MessageStore, Selection};
use crate::error::{FeedError, Result};
use crate::types::{Record, RecordId, Row};
use parking_lot::RwLock;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One entry of a JSON seed document.
#[derive(Deserialize)]
struct SeedRecord {
    #[serde(default)]
    id: Option<i64>,
    text: String,
    author: String,
    #[serde(default)]
    favorite: bool,
}

struct Inner {
    /// Rows in insertion order.
    records: Vec<Record>,
    next_id: Option<i64>,
    closed: bool,
}

/// Shared in-memory message store.
///
/// Cloning yields another handle to the same rows, so a test can keep one
/// handle while the feed's worker owns another.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
    queries: Arc<AtomicU64>,
    updates: Arc<AtomicU64>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                records: Vec::new(),
                next_id: Some(1),
                closed: false,
            })),
            queries: Arc::new(AtomicU64::new(0)),
            updates: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a store from a JSON array of `{id?, text, author, favorite?}`.
    ///
    /// Entries without an id are numbered after the highest explicit id.
    pub fn from_json(json: &str) -> Result<Self> {
        let seed: Vec<SeedRecord> = serde_json::from_str(json)?;
        let store = Self::new();

        let mut next_id = seed
            .iter()
            .filter_map(|s| s.id)
            .max()
            .unwrap_or(0)
            .checked_add(1);
        for entry in seed {
            let id = match entry.id {
                Some(id) => id,
                None => {
                    let id = next_id.ok_or_else(|| {
                        FeedError::InvalidSeed(format!("no record id left after {}", i64::MAX))
                    })?;
                    next_id = id.checked_add(1);
                    id
                }
            };
            let record = Record::new(RecordId(id), entry.text, entry.author)
                .with_favorite(entry.favorite);
            store.put(record)?;
        }

        Ok(store)
    }

    /// Append a new non-favorite message, returning its assigned id.
    ///
    /// Fails once a record with id `i64::MAX` exists.
    pub fn insert(&self, text: impl Into<String>, author: impl Into<String>) -> Result<RecordId> {
        let mut inner = self.inner.write();
        let id = inner.next_id.ok_or(FeedError::IdsExhausted)?;
        inner.next_id = id.checked_add(1);
        let id = RecordId(id);
        inner.records.push(Record::new(id, text, author));
        Ok(id)
    }

    /// Insert a record with a caller-chosen id.
    pub fn put(&self, record: Record) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.records.iter().any(|r| r.same_entity(&record)) {
            return Err(FeedError::InvalidSeed(format!(
                "duplicate record id {}",
                record.id
            )));
        }
        // Ids are handed out above the highest one seen; None once that is i64::MAX.
        inner.next_id = match (inner.next_id, record.id.0.checked_add(1)) {
            (Some(current), Some(after)) => Some(current.max(after)),
            _ => None,
        };
        inner.records.push(record);
        Ok(())
    }

    /// Look up a record by id, bypassing the contract.
    pub fn get(&self, id: RecordId) -> Option<Record> {
        self.inner.read().records.iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every contract call fail until [`MemoryStore::reopen`].
    pub fn close(&self) {
        self.inner.write().closed = true;
    }

    pub fn reopen(&self) {
        self.inner.write().closed = false;
    }

    /// Number of `query` calls served so far (including failed ones).
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    /// Number of `update` calls served so far (including failed ones).
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::SeqCst)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStore for MemoryStore {
    fn query(&self, selection: Selection) -> Result<Vec<Row>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.read();
        if inner.closed {
            return Err(FeedError::Closed);
        }

        Ok(inner
            .records
            .iter()
            .filter(|r| selection.matches(r.favorite))
            .map(Record::to_row)
            .collect())
    }

    fn update(&mut self, id: RecordId, values: FavoriteUpdate) -> Result<usize> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.write();
        if inner.closed {
            return Err(FeedError::Closed);
        }

        let mut affected = 0;
        for record in inner.records.iter_mut().filter(|r| r.id == id) {
            record.favorite = values.favorite;
            affected += 1;
        }
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let store = MemoryStore::new();
        assert_eq!(store.insert("a", "x").unwrap(), RecordId(1));
        assert_eq!(store.insert("b", "y").unwrap(), RecordId(2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_clones_share_rows() {
        let store = MemoryStore::new();
        let other = store.clone();
        let id = store.insert("shared", "both").unwrap();
        assert_eq!(other.get(id).unwrap().text, "shared");
    }

    #[test]
    fn test_query_filters_favorites() {
        let mut store = MemoryStore::new();
        let a = store.insert("a", "x").unwrap();
        store.insert("b", "y").unwrap();
        store.update(a, FavoriteUpdate { favorite: true }).unwrap();

        assert_eq!(store.query(Selection::All).unwrap().len(), 2);
        assert_eq!(store.query(Selection::Favorite(true)).unwrap().len(), 1);
        assert_eq!(store.query(Selection::Favorite(false)).unwrap().len(), 1);
        assert_eq!(store.query_count(), 3);
    }

    #[test]
    fn test_update_missing_row() {
        let mut store = MemoryStore::new();
        let affected = store
            .update(RecordId(5), FavoriteUpdate { favorite: true })
            .unwrap();
        assert_eq!(affected, 0);
    }

    #[test]
    fn test_closed_store_fails() {
        let mut store = MemoryStore::new();
        store.insert("a", "x").unwrap();
        store.close();
        assert!(matches!(store.query(Selection::All), Err(FeedError::Closed)));
        assert!(store
            .update(RecordId(1), FavoriteUpdate { favorite: true })
            .is_err());
        assert_eq!(store.update_count(), 1);
    }

    #[test]
    fn test_from_json() {
        let store = MemoryStore::from_json(
            r#"[
                {"id": 10, "text": "Ten", "author": "T", "favorite": true},
                {"text": "Next", "author": "N"}
            ]"#,
        )
        .unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.get(RecordId(10)).unwrap().favorite);
        assert_eq!(store.get(RecordId(11)).unwrap().text, "Next");
        assert_eq!(store.insert("after", "A").unwrap(), RecordId(12));
    }

    #[test]
    fn test_from_json_rejects_duplicates() {
        let result = MemoryStore::from_json(
            r#"[{"id": 1, "text": "a", "author": "x"}, {"id": 1, "text": "b", "author": "y"}]"#,
        );
        assert!(matches!(result, Err(FeedError::InvalidSeed(_))));
    }

    #[test]
    fn test_from_json_highest_id() {
        let store = MemoryStore::from_json(
            r#"[{"id": 9223372036854775807, "text": "last", "author": "a"}]"#,
        )
        .unwrap();

        assert_eq!(store.get(RecordId(i64::MAX)).unwrap().text, "last");
        assert!(matches!(store.insert("more", "b"), Err(FeedError::IdsExhausted)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_from_json_no_id_left_after_highest() {
        let result = MemoryStore::from_json(
            r#"[
                {"id": 9223372036854775807, "text": "last", "author": "a"},
                {"text": "unnumbered", "author": "b"}
            ]"#,
        );
        assert!(matches!(result, Err(FeedError::InvalidSeed(_))));
    }

    #[test]
    fn test_put_highest_id_stops_inserts() {
        let store = MemoryStore::new();
        assert_eq!(store.insert("a", "x").unwrap(), RecordId(1));
        store
            .put(Record::new(RecordId(i64::MAX), "last", "b"))
            .unwrap();
        assert!(matches!(store.insert("x", "c"), Err(FeedError::IdsExhausted)));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(MemoryStore::from_json("{not json").is_err());
    }
}
