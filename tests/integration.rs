//! Integration tests for the message feed on a real worker thread.

use recall::{
    FeedConfig, MemoryStore, MessageFeed, ObservableState, Record, RecordId, TaskStatus,
};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn abc_store() -> MemoryStore {
    MemoryStore::from_json(
        r#"[
            {"id": 1, "text": "A", "author": "first"},
            {"id": 2, "text": "B", "author": "second"},
            {"id": 3, "text": "C", "author": "third"}
        ]"#,
    )
    .unwrap()
}

fn spawn_feed(store: MemoryStore) -> MessageFeed<MemoryStore> {
    init_tracing();
    MessageFeed::spawn(store, FeedConfig::default().with_worker_name("feed-test")).unwrap()
}

/// Wait for the favorites state to reach `version`, then return its value.
fn favorites_at(state: &ObservableState<Vec<Record>>, version: u64) -> Vec<Record> {
    let watch = state.watch();
    loop {
        if state.version() >= version {
            return state.get().unwrap();
        }
        watch.recv_timeout(WAIT).unwrap();
    }
}

// --- Scenario Tests ---

#[test]
fn test_favorite_toggle_scenario() {
    let feed = spawn_feed(abc_store());
    let random = feed.observe_random_message().watch();

    // Two picks in a row never repeat.
    feed.request_new_random_message().unwrap();
    feed.request_new_random_message().unwrap();
    let first = random.recv_timeout(WAIT).unwrap().unwrap();
    let second = random.recv_timeout(WAIT).unwrap().unwrap();
    assert_ne!(first.id, second.id);

    let favorites = feed.observe_favorites();

    let handle = feed.set_favorite(RecordId(2), true).unwrap();
    assert_eq!(handle.wait_timeout(WAIT), TaskStatus::Completed);
    let current = favorites_at(&favorites, 1);
    assert_eq!(
        current,
        vec![Record::new(RecordId(2), "B", "second").with_favorite(true)]
    );

    feed.set_favorite(RecordId(2), false).unwrap();
    assert!(favorites_at(&favorites, 2).is_empty());

    feed.shutdown();
}

#[test]
fn test_unknown_id_does_not_refresh() {
    let store = abc_store();
    let feed = spawn_feed(store.clone());

    let missing = feed.set_favorite(RecordId(77), true).unwrap();
    assert_eq!(missing.wait_timeout(WAIT), TaskStatus::Completed);

    // Anything the update queued would run before this.
    let barrier = feed.request_new_random_message().unwrap();
    assert_eq!(barrier.wait_timeout(WAIT), TaskStatus::Completed);

    assert_eq!(feed.observe_favorites().version(), 0);
    assert_eq!(store.update_count(), 1);
    // Only the random pick queried the store.
    assert_eq!(store.query_count(), 1);
    feed.shutdown();
}

#[test]
fn test_late_subscriber_gets_current_message() {
    let feed = spawn_feed(abc_store());

    let handle = feed.request_new_random_message().unwrap();
    assert_eq!(handle.wait_timeout(WAIT), TaskStatus::Completed);

    let state = feed.observe_random_message();
    let current = state.get().unwrap();
    let watch = state.watch();
    assert_eq!(watch.try_recv().unwrap(), current);
    assert!(watch.subscription.has_received());
    feed.shutdown();
}

#[test]
fn test_single_message_repeats() {
    let store = MemoryStore::new();
    let only = store.insert("Only one", "solo").unwrap();
    let feed = spawn_feed(store);
    let watch = feed.observe_random_message().watch();

    for _ in 0..5 {
        feed.request_new_random_message().unwrap();
    }
    for _ in 0..5 {
        assert_eq!(watch.recv_timeout(WAIT).unwrap().unwrap().id, only);
    }
    feed.shutdown();
}

#[test]
fn test_empty_store_is_explicit_empty_state() {
    let feed = spawn_feed(MemoryStore::new());
    let state = feed.observe_random_message();

    // Nothing requested yet: still loading.
    assert_eq!(state.get(), None);

    let watch = state.watch();
    feed.request_new_random_message().unwrap();
    assert_eq!(watch.recv_timeout(WAIT).unwrap(), None);
    assert_eq!(state.get(), Some(None));
    feed.shutdown();
}

#[test]
fn test_messages_added_between_picks_are_candidates() {
    let store = MemoryStore::new();
    let first = store.insert("first", "a").unwrap();
    let feed = spawn_feed(store.clone());
    let watch = feed.observe_random_message().watch();

    feed.request_new_random_message().unwrap();
    assert_eq!(watch.recv_timeout(WAIT).unwrap().unwrap().id, first);

    let second = store.insert("second", "b").unwrap();
    feed.request_new_random_message().unwrap();
    assert_eq!(watch.recv_timeout(WAIT).unwrap().unwrap().id, second);
    feed.shutdown();
}

#[test]
fn test_eager_load_on_worker() {
    init_tracing();
    let feed = MessageFeed::spawn(
        abc_store(),
        FeedConfig::default().with_load_on_start(true).with_seed(3),
    )
    .unwrap();

    let favorites = feed.observe_favorites().watch();
    let random = feed.observe_random_message().watch();
    assert_eq!(favorites.recv_timeout(WAIT).unwrap(), vec![]);
    assert!(random.recv_timeout(WAIT).unwrap().is_some());
    feed.shutdown();
}
