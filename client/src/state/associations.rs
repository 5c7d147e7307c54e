//! Client-side cache for collection/source association queries.
//!
//! DESIGN
//! ======
//! `AssociationCache` is plain data keyed by `CollectionId`. Views read it
//! through a `RwSignal`, so a cache write is the only thing that re-renders a
//! source list. Network access is behind `AssociationClient` and cache access
//! behind `AssociationStore`, which lets the async drivers (`load`, `remove`)
//! run headless in tests.
//!
//! CONSISTENCY
//! ===========
//! The cache never edits a source list locally. Settling a removal, whether
//! the server accepted it or not, invalidates the query, and the list changes
//! only when a refetch lands.
//! Each fetch carries a ticket, and only the newest ticket for a collection
//! may write, so a slow response cannot overwrite a newer one.

#[cfg(test)]
#[path = "associations_test.rs"]
mod associations_test;

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use leptos::prelude::*;

use crate::net::api::HttpAssociationClient;
use crate::net::types::{ApiError, AssociationKey, AssociationList, CollectionId, SourceId};

// =============================================================================
// QUERY STATE
// =============================================================================

/// Lifecycle of one collection's association query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum QueryState {
    #[default]
    Pending,
    Loaded(AssociationList),
    Failed(ApiError),
}

/// Identifies one fetch attempt. Tickets increase monotonically per cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// Last removal that the server rejected for a collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovalFailure {
    pub source_id: SourceId,
    pub error: ApiError,
}

/// Cached query for a single collection.
#[derive(Clone, Debug, Default)]
pub struct QueryEntry {
    state: QueryState,
    /// Sources with a removal request in flight.
    removing: BTreeSet<SourceId>,
    removal_failure: Option<RemovalFailure>,
    subscribers: usize,
    stale: bool,
    in_flight: Option<FetchTicket>,
}

impl QueryEntry {
    #[must_use]
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    #[must_use]
    pub fn is_removing(&self, source_id: SourceId) -> bool {
        self.removing.contains(&source_id)
    }

    #[must_use]
    pub fn removal_failure(&self) -> Option<&RemovalFailure> {
        self.removal_failure.as_ref()
    }

    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    #[must_use]
    pub fn subscribers(&self) -> usize {
        self.subscribers
    }
}

// =============================================================================
// CACHE
// =============================================================================

/// Association queries keyed by collection.
#[derive(Clone, Debug, Default)]
pub struct AssociationCache {
    entries: HashMap<CollectionId, QueryEntry>,
    next_ticket: u64,
}

impl AssociationCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entry(&self, collection_id: CollectionId) -> Option<&QueryEntry> {
        self.entries.get(&collection_id)
    }

    /// Register a view of `collection_id`. When the entry needs data, the
    /// fetch is marked in flight here and its ticket returned; the caller
    /// must run it with [`fetch`].
    pub fn subscribe(&mut self, collection_id: CollectionId) -> Option<FetchTicket> {
        let entry = self.entries.entry(collection_id).or_default();
        entry.subscribers += 1;
        let needs_fetch = match entry.in_flight {
            Some(_) => false,
            None => entry.stale || !matches!(entry.state, QueryState::Loaded(_)),
        };
        needs_fetch.then(|| self.begin_fetch(collection_id))
    }

    /// Drop a view of `collection_id`. The entry is evicted with its last
    /// subscriber, so the next mount starts from `Pending`.
    pub fn unsubscribe(&mut self, collection_id: CollectionId) {
        let Some(entry) = self.entries.get_mut(&collection_id) else {
            return;
        };
        entry.subscribers = entry.subscribers.saturating_sub(1);
        if entry.subscribers == 0 {
            self.entries.remove(&collection_id);
        }
    }

    /// Start a fetch and supersede any fetch already in flight.
    pub fn begin_fetch(&mut self, collection_id: CollectionId) -> FetchTicket {
        self.next_ticket += 1;
        let ticket = FetchTicket(self.next_ticket);
        let entry = self.entries.entry(collection_id).or_default();
        if matches!(entry.state, QueryState::Failed(_)) {
            entry.state = QueryState::Pending;
        }
        entry.stale = false;
        entry.in_flight = Some(ticket);
        ticket
    }

    /// Apply a fetch result. Returns `false` when `ticket` was superseded or
    /// the entry was evicted, in which case the result is discarded.
    pub fn finish_fetch(
        &mut self,
        collection_id: CollectionId,
        ticket: FetchTicket,
        result: Result<AssociationList, ApiError>,
    ) -> bool {
        let Some(entry) = self.entries.get_mut(&collection_id) else {
            return false;
        };
        if entry.in_flight != Some(ticket) {
            return false;
        }
        entry.in_flight = None;
        entry.state = match result {
            Ok(list) => QueryState::Loaded(list),
            Err(error) => QueryState::Failed(error),
        };
        true
    }

    /// Mark a query stale. Returns `true` when a view is subscribed and a
    /// refetch should be issued.
    pub fn invalidate(&mut self, collection_id: CollectionId) -> bool {
        match self.entries.get_mut(&collection_id) {
            Some(entry) => {
                entry.stale = true;
                entry.subscribers > 0
            }
            None => false,
        }
    }

    /// Record a removal request. Returns `false` if the same removal is
    /// already in flight. Collections nobody views are not tracked.
    pub fn begin_removal(&mut self, key: AssociationKey) -> bool {
        let Some(entry) = self.entries.get_mut(&key.collection_id) else {
            return true;
        };
        if entry.removal_failure.as_ref().is_some_and(|f| f.source_id == key.source_id) {
            entry.removal_failure = None;
        }
        entry.removing.insert(key.source_id)
    }

    /// Settle a removal request and invalidate the collection's query.
    /// Returns whether to refetch.
    ///
    /// A rejection is recorded for display. The server's association set is
    /// unknown after one (the link may already be gone), so the query is
    /// refetched either way.
    pub fn finish_removal(&mut self, key: AssociationKey, result: &Result<(), ApiError>) -> bool {
        let Some(entry) = self.entries.get_mut(&key.collection_id) else {
            return false;
        };
        entry.removing.remove(&key.source_id);
        if let Err(error) = result {
            entry.removal_failure = Some(RemovalFailure { source_id: key.source_id, error: error.clone() });
        }
        self.invalidate(key.collection_id)
    }
}

// =============================================================================
// SEAMS
// =============================================================================

/// Remote read/write operations on associations.
#[async_trait(?Send)]
pub trait AssociationClient {
    /// Fetch the sources currently associated with a collection.
    async fn fetch_associations(&self, collection_id: CollectionId) -> Result<AssociationList, ApiError>;

    /// Delete one association.
    async fn remove_association(&self, key: AssociationKey) -> Result<(), ApiError>;
}

/// Mutable handle to an [`AssociationCache`].
pub trait AssociationStore {
    /// Run `f` against the cache. Returns `None` if the cache is gone
    /// (e.g. its reactive owner was disposed).
    fn update_cache<R>(&self, f: impl FnOnce(&mut AssociationCache) -> R) -> Option<R>;
}

impl AssociationStore for RwSignal<AssociationCache> {
    fn update_cache<R>(&self, f: impl FnOnce(&mut AssociationCache) -> R) -> Option<R> {
        self.try_update(f)
    }
}

impl AssociationStore for RefCell<AssociationCache> {
    fn update_cache<R>(&self, f: impl FnOnce(&mut AssociationCache) -> R) -> Option<R> {
        Some(f(&mut self.borrow_mut()))
    }
}

// =============================================================================
// DRIVERS
// =============================================================================

/// Start a new fetch of a collection's associations and apply it to the cache.
pub async fn load<S, C>(store: &S, client: &C, collection_id: CollectionId)
where
    S: AssociationStore,
    C: AssociationClient + ?Sized,
{
    if let Some(ticket) = store.update_cache(|cache| cache.begin_fetch(collection_id)) {
        fetch(store, client, collection_id, ticket).await;
    }
}

/// Run a fetch already marked in flight under `ticket`.
pub async fn fetch<S, C>(store: &S, client: &C, collection_id: CollectionId, ticket: FetchTicket)
where
    S: AssociationStore,
    C: AssociationClient + ?Sized,
{
    let result = client.fetch_associations(collection_id).await;
    if let Err(err) = &result {
        log::warn!("association fetch for collection {collection_id} failed: {err}");
    }
    let applied = store
        .update_cache(|cache| cache.finish_fetch(collection_id, ticket, result))
        .unwrap_or(false);
    if !applied {
        log::debug!("discarded superseded association fetch for collection {collection_id}");
    }
}

/// Remove one association, then refetch the collection if it is still viewed.
///
/// A duplicate request for a removal already in flight is a no-op.
///
/// # Errors
///
/// Returns the server's rejection. The list is still refetched in that case,
/// so it shows whatever the server now holds.
pub async fn remove<S, C>(store: &S, client: &C, key: AssociationKey) -> Result<(), ApiError>
where
    S: AssociationStore,
    C: AssociationClient + ?Sized,
{
    if !store.update_cache(|cache| cache.begin_removal(key)).unwrap_or(false) {
        log::debug!("removal of source {} already in flight", key.source_id);
        return Ok(());
    }

    let result = client.remove_association(key).await;
    let refetch = store
        .update_cache(|cache| cache.finish_removal(key, &result))
        .unwrap_or(false);

    match &result {
        Ok(()) => log::info!("removed source {} from collection {}", key.source_id, key.collection_id),
        Err(err) => log::warn!(
            "removing source {} from collection {} failed: {err}",
            key.source_id,
            key.collection_id
        ),
    }

    if refetch {
        load(store, client, key.collection_id).await;
    }
    result
}

// =============================================================================
// CONTEXT
// =============================================================================

/// Association cache plus the client that feeds it, provided via context.
#[derive(Clone)]
pub struct AssociationContext {
    pub cache: RwSignal<AssociationCache>,
    pub client: Arc<dyn AssociationClient + Send + Sync>,
}

impl AssociationContext {
    pub fn new(client: Arc<dyn AssociationClient + Send + Sync>) -> Self {
        Self { cache: RwSignal::new(AssociationCache::new()), client }
    }

    /// Context backed by the server's REST endpoints.
    pub fn http() -> Self {
        Self::new(Arc::new(HttpAssociationClient))
    }

    pub fn spawn_load(&self, collection_id: CollectionId) {
        let ctx = self.clone();
        leptos::task::spawn_local(async move {
            load(&ctx.cache, ctx.client.as_ref(), collection_id).await;
        });
    }

    pub fn spawn_fetch(&self, collection_id: CollectionId, ticket: FetchTicket) {
        let ctx = self.clone();
        leptos::task::spawn_local(async move {
            fetch(&ctx.cache, ctx.client.as_ref(), collection_id, ticket).await;
        });
    }

    pub fn spawn_remove(&self, key: AssociationKey) {
        let ctx = self.clone();
        leptos::task::spawn_local(async move {
            // Failures are recorded on the cache entry and rendered from there.
            let _ = remove(&ctx.cache, ctx.client.as_ref(), key).await;
        });
    }
}
