use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::executor::block_on;

use super::*;
use crate::net::types::Source;

// =============================================================
// Helpers
// =============================================================

const COLLECTION: CollectionId = CollectionId(42);

fn source(id: i64, name: &str) -> Source {
    Source { id: SourceId(id), name: name.to_owned(), label: None, homepage: None, platform: None }
}

fn key(source_id: i64) -> AssociationKey {
    AssociationKey { source_id: SourceId(source_id), collection_id: COLLECTION }
}

/// Subscribe one view and run the fetch it asked for.
fn mount(store: &RefCell<AssociationCache>, client: &FakeDirectory) {
    let ticket = store.borrow_mut().subscribe(COLLECTION);
    if let Some(ticket) = ticket {
        block_on(fetch(store, client, COLLECTION, ticket));
    }
}

fn loaded_ids(cache: &AssociationCache) -> Vec<i64> {
    match cache.entry(COLLECTION).map(QueryEntry::state) {
        Some(QueryState::Loaded(list)) => list.sources.iter().map(|s| s.id.0).collect(),
        other => panic!("expected loaded state, got {other:?}"),
    }
}

/// Yields once before completing so concurrent drivers interleave.
struct YieldNow(bool);

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// In-memory stand-in for the association endpoints.
#[derive(Default)]
struct FakeDirectory {
    sources: RefCell<Vec<Source>>,
    fetches: Cell<usize>,
    removals: RefCell<Vec<AssociationKey>>,
    fail_fetch: Cell<bool>,
    fail_remove: Cell<bool>,
}

impl FakeDirectory {
    fn with_sources(sources: Vec<Source>) -> Self {
        Self { sources: RefCell::new(sources), ..Self::default() }
    }
}

#[async_trait(?Send)]
impl AssociationClient for FakeDirectory {
    async fn fetch_associations(&self, collection_id: CollectionId) -> Result<AssociationList, ApiError> {
        assert_eq!(collection_id, COLLECTION);
        self.fetches.set(self.fetches.get() + 1);
        YieldNow(false).await;
        if self.fail_fetch.get() {
            return Err(ApiError::Status(500));
        }
        Ok(AssociationList { sources: self.sources.borrow().clone() })
    }

    async fn remove_association(&self, key: AssociationKey) -> Result<(), ApiError> {
        self.removals.borrow_mut().push(key);
        YieldNow(false).await;
        if self.fail_remove.get() {
            return Err(ApiError::Status(403));
        }
        self.sources.borrow_mut().retain(|s| s.id != key.source_id);
        Ok(())
    }
}

// =============================================================
// Subscriptions
// =============================================================

#[test]
fn first_subscriber_starts_fetch() {
    let mut cache = AssociationCache::new();
    assert!(cache.subscribe(COLLECTION).is_some());
    let entry = cache.entry(COLLECTION).unwrap();
    assert_eq!(entry.state(), &QueryState::Pending);
    assert!(entry.is_fetching());
}

#[test]
fn second_subscriber_joins_fetch_started_by_first() {
    let mut cache = AssociationCache::new();
    assert!(cache.subscribe(COLLECTION).is_some());
    assert!(cache.subscribe(COLLECTION).is_none());
    assert_eq!(cache.entry(COLLECTION).map(QueryEntry::subscribers), Some(2));
}

#[test]
fn subscribe_to_loaded_entry_does_not_refetch() {
    let mut cache = AssociationCache::new();
    let ticket = cache.subscribe(COLLECTION).unwrap();
    cache.finish_fetch(COLLECTION, ticket, Ok(AssociationList::default()));
    assert!(cache.subscribe(COLLECTION).is_none());
    assert_eq!(cache.entry(COLLECTION).map(QueryEntry::subscribers), Some(2));
}

#[test]
fn subscribe_to_failed_entry_retries() {
    let mut cache = AssociationCache::new();
    let ticket = cache.subscribe(COLLECTION).unwrap();
    cache.finish_fetch(COLLECTION, ticket, Err(ApiError::Status(500)));
    assert!(cache.subscribe(COLLECTION).is_some());
    assert_eq!(cache.entry(COLLECTION).map(QueryEntry::state), Some(&QueryState::Pending));
}

#[test]
fn last_unsubscribe_evicts_so_remount_starts_pending() {
    let mut cache = AssociationCache::new();
    let ticket = cache.subscribe(COLLECTION).unwrap();
    cache.finish_fetch(COLLECTION, ticket, Ok(AssociationList { sources: vec![source(1, "A")] }));
    cache.unsubscribe(COLLECTION);
    assert!(cache.entry(COLLECTION).is_none());
    assert!(cache.subscribe(COLLECTION).is_some());
    assert_eq!(cache.entry(COLLECTION).map(QueryEntry::state), Some(&QueryState::Pending));
}

#[test]
fn invalidate_requests_refetch_only_with_subscribers() {
    let mut cache = AssociationCache::new();
    assert!(!cache.invalidate(COLLECTION));
    cache.subscribe(COLLECTION);
    assert!(cache.invalidate(COLLECTION));
    assert!(cache.entry(COLLECTION).is_some_and(QueryEntry::is_stale));
}

// =============================================================
// Fetch lifecycle
// =============================================================

#[test]
fn finish_fetch_moves_pending_to_loaded() {
    let mut cache = AssociationCache::new();
    let ticket = cache.subscribe(COLLECTION).unwrap();
    assert!(cache.finish_fetch(COLLECTION, ticket, Ok(AssociationList { sources: vec![source(1, "A")] })));
    assert_eq!(loaded_ids(&cache), vec![1]);
    assert!(!cache.entry(COLLECTION).is_some_and(QueryEntry::is_fetching));
}

#[test]
fn superseded_fetch_result_is_discarded() {
    let mut cache = AssociationCache::new();
    let older = cache.subscribe(COLLECTION).unwrap();
    let newer = cache.begin_fetch(COLLECTION);
    assert!(cache.finish_fetch(COLLECTION, newer, Ok(AssociationList { sources: vec![source(2, "B")] })));
    assert!(!cache.finish_fetch(COLLECTION, older, Ok(AssociationList { sources: vec![source(1, "A")] })));
    assert_eq!(loaded_ids(&cache), vec![2]);
}

#[test]
fn fetch_result_for_evicted_entry_is_discarded() {
    let mut cache = AssociationCache::new();
    let ticket = cache.subscribe(COLLECTION).unwrap();
    cache.unsubscribe(COLLECTION);
    assert!(!cache.finish_fetch(COLLECTION, ticket, Ok(AssociationList::default())));
    assert!(cache.entry(COLLECTION).is_none());
}

#[test]
fn failed_fetch_is_retried_from_pending() {
    let mut cache = AssociationCache::new();
    let ticket = cache.subscribe(COLLECTION).unwrap();
    cache.finish_fetch(COLLECTION, ticket, Err(ApiError::Status(500)));
    assert_eq!(
        cache.entry(COLLECTION).map(QueryEntry::state),
        Some(&QueryState::Failed(ApiError::Status(500)))
    );
    cache.begin_fetch(COLLECTION);
    assert_eq!(cache.entry(COLLECTION).map(QueryEntry::state), Some(&QueryState::Pending));
}

#[test]
fn refetch_keeps_loaded_list_visible() {
    let mut cache = AssociationCache::new();
    let ticket = cache.subscribe(COLLECTION).unwrap();
    cache.finish_fetch(COLLECTION, ticket, Ok(AssociationList { sources: vec![source(1, "A")] }));
    cache.invalidate(COLLECTION);
    cache.begin_fetch(COLLECTION);
    assert_eq!(loaded_ids(&cache), vec![1]);
}

// =============================================================
// Removal bookkeeping
// =============================================================

#[test]
fn duplicate_removal_is_rejected_while_in_flight() {
    let mut cache = AssociationCache::new();
    cache.subscribe(COLLECTION);
    assert!(cache.begin_removal(key(1)));
    assert!(!cache.begin_removal(key(1)));
    assert!(cache.entry(COLLECTION).is_some_and(|e| e.is_removing(SourceId(1))));
}

#[test]
fn failed_removal_is_recorded_and_invalidates_query() {
    let mut cache = AssociationCache::new();
    let ticket = cache.subscribe(COLLECTION).unwrap();
    cache.finish_fetch(COLLECTION, ticket, Ok(AssociationList { sources: vec![source(1, "A")] }));
    cache.begin_removal(key(1));
    assert!(cache.finish_removal(key(1), &Err(ApiError::Status(403))));
    let entry = cache.entry(COLLECTION).unwrap();
    assert!(!entry.is_removing(SourceId(1)));
    assert!(entry.is_stale());
    assert_eq!(
        entry.removal_failure(),
        Some(&RemovalFailure { source_id: SourceId(1), error: ApiError::Status(403) })
    );
    assert_eq!(loaded_ids(&cache), vec![1]);
}

#[test]
fn retrying_removal_clears_previous_failure() {
    let mut cache = AssociationCache::new();
    cache.subscribe(COLLECTION);
    cache.begin_removal(key(1));
    cache.finish_removal(key(1), &Err(ApiError::Status(500)));
    cache.begin_removal(key(1));
    assert!(cache.entry(COLLECTION).unwrap().removal_failure().is_none());
}

#[test]
fn successful_removal_invalidates_subscribed_query() {
    let mut cache = AssociationCache::new();
    cache.subscribe(COLLECTION);
    cache.begin_removal(key(1));
    assert!(cache.finish_removal(key(1), &Ok(())));
    assert!(cache.entry(COLLECTION).is_some_and(QueryEntry::is_stale));
}

#[test]
fn removal_for_unviewed_collection_leaves_no_entry() {
    let mut cache = AssociationCache::new();
    assert!(cache.begin_removal(key(1)));
    assert!(!cache.finish_removal(key(1), &Err(ApiError::Status(500))));
    assert!(cache.entry(COLLECTION).is_none());
    cache.subscribe(COLLECTION);
    assert!(cache.entry(COLLECTION).unwrap().removal_failure().is_none());
}

// =============================================================
// Drivers
// =============================================================

#[test]
fn mount_populates_cache() {
    let client = FakeDirectory::with_sources(vec![source(1, "A"), source(2, "B")]);
    let store = RefCell::new(AssociationCache::new());
    mount(&store, &client);
    assert_eq!(loaded_ids(&store.borrow()), vec![1, 2]);
    assert_eq!(client.fetches.get(), 1);
}

#[test]
fn two_views_of_one_collection_share_a_fetch() {
    let client = FakeDirectory::with_sources(vec![source(1, "A")]);
    let store = RefCell::new(AssociationCache::new());
    let first = store.borrow_mut().subscribe(COLLECTION);
    let second = store.borrow_mut().subscribe(COLLECTION);
    assert!(second.is_none());
    block_on(fetch(&store, &client, COLLECTION, first.unwrap()));
    assert_eq!(client.fetches.get(), 1);
    assert_eq!(loaded_ids(&store.borrow()), vec![1]);
}

#[test]
fn load_failure_moves_to_failed() {
    let client = FakeDirectory::default();
    client.fail_fetch.set(true);
    let store = RefCell::new(AssociationCache::new());
    mount(&store, &client);
    assert!(matches!(
        store.borrow().entry(COLLECTION).map(QueryEntry::state),
        Some(QueryState::Failed(ApiError::Status(500)))
    ));
}

#[test]
fn load_retries_failed_query() {
    let client = FakeDirectory::with_sources(vec![source(1, "A")]);
    client.fail_fetch.set(true);
    let store = RefCell::new(AssociationCache::new());
    mount(&store, &client);
    client.fail_fetch.set(false);
    block_on(load(&store, &client, COLLECTION));
    assert_eq!(loaded_ids(&store.borrow()), vec![1]);
    assert_eq!(client.fetches.get(), 2);
}

#[test]
fn remove_issues_mutation_then_reflects_server_state() {
    let client = FakeDirectory::with_sources(vec![source(1, "A"), source(2, "B")]);
    let store = RefCell::new(AssociationCache::new());
    mount(&store, &client);

    let result = block_on(remove(&store, &client, key(1)));

    assert_eq!(result, Ok(()));
    assert_eq!(*client.removals.borrow(), vec![key(1)]);
    assert_eq!(client.fetches.get(), 2);
    assert_eq!(loaded_ids(&store.borrow()), vec![2]);
    assert!(!store.borrow().entry(COLLECTION).unwrap().is_removing(SourceId(1)));
}

#[test]
fn rejected_remove_refetches_and_keeps_source_listed() {
    let client = FakeDirectory::with_sources(vec![source(1, "A")]);
    client.fail_remove.set(true);
    let store = RefCell::new(AssociationCache::new());
    mount(&store, &client);

    let result = block_on(remove(&store, &client, key(1)));

    assert_eq!(result, Err(ApiError::Status(403)));
    assert_eq!(client.fetches.get(), 2);
    assert_eq!(loaded_ids(&store.borrow()), vec![1]);
    assert!(store.borrow().entry(COLLECTION).unwrap().removal_failure().is_some());
}

#[test]
fn rejected_remove_converges_when_link_already_gone() {
    let client = FakeDirectory::with_sources(vec![source(1, "A"), source(2, "B")]);
    let store = RefCell::new(AssociationCache::new());
    mount(&store, &client);
    // Another user drops source 1 before our request lands.
    client.sources.borrow_mut().retain(|s| s.id != SourceId(1));
    client.fail_remove.set(true);

    let result = block_on(remove(&store, &client, key(1)));

    assert!(result.is_err());
    assert_eq!(loaded_ids(&store.borrow()), vec![2]);
    let cache = store.borrow();
    let entry = cache.entry(COLLECTION).unwrap();
    assert!(!entry.is_stale());
    assert_eq!(entry.removal_failure().map(|f| f.source_id), Some(SourceId(1)));
}

#[test]
fn remove_without_subscriber_skips_refetch() {
    let client = FakeDirectory::with_sources(vec![source(1, "A")]);
    let store = RefCell::new(AssociationCache::new());
    assert_eq!(block_on(remove(&store, &client, key(1))), Ok(()));
    assert_eq!(client.fetches.get(), 0);
    assert!(client.sources.borrow().is_empty());
    assert!(store.borrow().entry(COLLECTION).is_none());
}

#[test]
fn concurrent_removals_converge_on_server_state() {
    let client = FakeDirectory::with_sources(vec![source(1, "A"), source(2, "B"), source(3, "C")]);
    let store = RefCell::new(AssociationCache::new());
    mount(&store, &client);

    let (first, second) = block_on(async {
        futures::join!(remove(&store, &client, key(1)), remove(&store, &client, key(3)))
    });

    assert_eq!(first, Ok(()));
    assert_eq!(second, Ok(()));
    assert_eq!(client.removals.borrow().len(), 2);
    assert_eq!(loaded_ids(&store.borrow()), vec![2]);
    let cache = store.borrow();
    let entry = cache.entry(COLLECTION).unwrap();
    assert!(!entry.is_fetching());
    assert!(!entry.is_stale());
}
