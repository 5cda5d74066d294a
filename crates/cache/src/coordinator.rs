//! The cache coordinator: entry bookkeeping, request deduplication,
//! sequence-ordered application and coarse invalidation.
//!
//! # Design notes
//!
//! The entry map sits behind a `std::sync::Mutex` that is never held
//! across an await point; flight completion is announced over a
//! `tokio::sync::watch` channel so joiners can park without holding the
//! lock. Each issued fetch carries a per-key monotonically increasing
//! sequence number, and a completed fetch is applied to the entry only
//! while its sequence is still the latest issued — a slow, superseded
//! request is returned to its own awaiter but never written back.

use crate::key::ResourceKey;
use crate::state::{Freshness, ResourceError, ResourceState};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

type Stored = Arc<dyn Any + Send + Sync>;

/// Errors that can occur during coordinator operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The underlying fetch failed; carries the classified error payload
    #[error("resource fetch failed: {0}")]
    Fetch(ResourceError),
    /// A cached value for this key holds a different type than requested
    #[error("cached value for `{key}` has an unexpected type")]
    TypeMismatch { key: String },
    /// Resource parameters could not be serialised into a key
    #[error("failed to serialise resource parameters: {0}")]
    Params(#[from] serde_json::Error),
}

struct Flight {
    seq: u64,
    done: watch::Receiver<bool>,
}

struct Entry {
    value: Option<Stored>,
    fetched_at: Option<Instant>,
    stale: bool,
    error: Option<ResourceError>,
    flight: Option<Flight>,
    /// Sequence of the most recently issued fetch for this key.
    seq_issued: u64,
    /// Sequence of the fetch whose result is currently applied.
    seq_applied: u64,
    /// Bumped on every invalidation, so a flight that straddles an
    /// invalidation cannot mark the entry fresh again.
    generation: u64,
    subscribers: usize,
    idle_since: Option<Instant>,
}

impl Entry {
    fn new() -> Self {
        Self {
            value: None,
            fetched_at: None,
            stale: false,
            error: None,
            flight: None,
            seq_issued: 0,
            seq_applied: 0,
            generation: 0,
            subscribers: 0,
            idle_since: Some(Instant::now()),
        }
    }
}

#[derive(Default)]
struct Inner {
    entries: Mutex<HashMap<ResourceKey, Entry>>,
}

/// The process-wide resource cache coordinator.
///
/// Cheap to clone; clones share one entry map. Construct isolated
/// instances freely in tests.
#[derive(Clone, Default)]
pub struct ResourceCache {
    inner: Arc<Inner>,
}

/// Records interest in a key. While at least one subscription for a key
/// is alive, [`ResourceCache::gc`] will not evict its entry. Dropping the
/// guard releases the interest; in-flight requests are never aborted by
/// unsubscription.
pub struct Subscription {
    inner: Arc<Inner>,
    key: ResourceKey,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut entries = self.inner.entries.lock().expect("cache lock poisoned");
        if let Some(entry) = entries.get_mut(&self.key) {
            entry.subscribers = entry.subscribers.saturating_sub(1);
            if entry.subscribers == 0 {
                entry.idle_since = Some(Instant::now());
            }
        }
    }
}

enum Plan {
    /// Serve the cached value without a network call.
    Hit(Stored),
    /// Await the flight already running for this key.
    Join { seq: u64, done: watch::Receiver<bool> },
    /// Issue a new fetch under the given sequence.
    Run {
        seq: u64,
        generation: u64,
        tx: watch::Sender<bool>,
    },
    /// The last fetch failed and no newer flight is running.
    Fail(ResourceError),
}

/// Deregisters a flight whose running future was dropped before it could
/// apply a result. The fetcher runs inside the caller's own future, so an
/// ordinary cancellation (timeout, select) would otherwise leave the
/// registered flight behind and wedge the key.
struct FlightGuard {
    inner: Arc<Inner>,
    key: ResourceKey,
    seq: u64,
    armed: bool,
}

impl FlightGuard {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut entries = self.inner.entries.lock().expect("cache lock poisoned");
        if let Some(entry) = entries.get_mut(&self.key) {
            if entry
                .flight
                .as_ref()
                .is_some_and(|flight| flight.seq == self.seq)
            {
                debug!(key = %self.key, seq = self.seq, "fetch cancelled, releasing flight");
                entry.flight = None;
            }
        }
    }
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the resource filed under `key`, fetching it with `fetcher`
    /// when the cached value is missing, stale, or outside its freshness
    /// window.
    ///
    /// Concurrent callers for one key share a single underlying call:
    /// whoever arrives while a flight is running awaits that flight
    /// instead of issuing another.
    ///
    /// # Errors
    ///
    /// - `CacheError::Fetch` when the underlying fetch (own or joined)
    ///   failed and no newer data arrived
    /// - `CacheError::TypeMismatch` when the key already holds a value of
    ///   a different type
    pub async fn fetch<T, F, Fut>(
        &self,
        key: &ResourceKey,
        freshness: Freshness,
        fetcher: F,
    ) -> Result<Arc<T>, CacheError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ResourceError>>,
    {
        let mut fetcher = Some(fetcher);
        // Sequence of a flight we joined, if any; data applied at or after
        // this sequence satisfies the join even outside the freshness
        // window (the joiner accepts the flight's result, it does not
        // re-evaluate policy).
        let mut joined_seq: Option<u64> = None;

        loop {
            let plan = {
                let mut entries = self.inner.entries.lock().expect("cache lock poisoned");
                let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
                self.plan(entry, freshness, joined_seq)
            };

            match plan {
                Plan::Hit(stored) => {
                    return stored
                        .downcast::<T>()
                        .map_err(|_| CacheError::TypeMismatch {
                            key: key.to_string(),
                        });
                }
                Plan::Fail(err) => return Err(CacheError::Fetch(err)),
                Plan::Join { seq, done } => {
                    debug!(key = %key, seq, "joining in-flight fetch");
                    joined_seq = Some(seq);
                    let mut done = done;
                    // A dropped sender means the flight aborted; loop and
                    // re-plan either way.
                    let _ = done.changed().await;
                }
                Plan::Run {
                    seq,
                    generation,
                    tx,
                } => {
                    let fetch = fetcher.take().expect("fetch plan issued twice for one caller");
                    let guard = FlightGuard {
                        inner: Arc::clone(&self.inner),
                        key: key.clone(),
                        seq,
                        armed: true,
                    };
                    debug!(key = %key, seq, "fetching resource");
                    let result = fetch().await;
                    let outcome = self.apply(key, seq, generation, result);
                    guard.disarm();
                    // Wake joiners only after the entry reflects the result.
                    let _ = tx.send(true);
                    return outcome;
                }
            }
        }
    }

    /// Decides, under the lock, how this caller proceeds.
    fn plan(&self, entry: &mut Entry, freshness: Freshness, joined_seq: Option<u64>) -> Plan {
        // A joiner came back from a completed flight: accept whatever got
        // applied at or after the flight it joined.
        if let Some(joined) = joined_seq {
            if entry.seq_applied >= joined {
                if let Some(value) = &entry.value {
                    return Plan::Hit(Arc::clone(value));
                }
            }
            if entry.flight.is_none() {
                if let Some(err) = &entry.error {
                    return Plan::Fail(err.clone());
                }
            }
        }

        if let (Some(value), Some(at)) = (&entry.value, entry.fetched_at) {
            if !entry.stale && is_fresh(at, freshness) {
                return Plan::Hit(Arc::clone(value));
            }
        }

        // A closed channel means the running future was dropped without
        // applying a result; forget the flight rather than joining it.
        if entry
            .flight
            .as_ref()
            .is_some_and(|flight| flight.done.has_changed().is_err())
        {
            entry.flight = None;
        }

        // Join only flights that are still trusted; an invalidation since
        // the flight started means its result must not satisfy this read.
        if let Some(flight) = &entry.flight {
            if !entry.stale {
                return Plan::Join {
                    seq: flight.seq,
                    done: flight.done.clone(),
                };
            }
        }

        let seq = entry.seq_issued + 1;
        entry.seq_issued = seq;
        let (tx, rx) = watch::channel(false);
        entry.flight = Some(Flight { seq, done: rx });
        Plan::Run {
            seq,
            generation: entry.generation,
            tx,
        }
    }

    /// Applies a completed fetch, honouring the ordering rule: the result
    /// lands only while its sequence is still the latest issued.
    fn apply<T>(
        &self,
        key: &ResourceKey,
        seq: u64,
        generation: u64,
        result: Result<T, ResourceError>,
    ) -> Result<Arc<T>, CacheError>
    where
        T: Send + Sync + 'static,
    {
        let mut entries = self.inner.entries.lock().expect("cache lock poisoned");
        let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
        let latest = entry.seq_issued == seq;

        match result {
            Ok(value) => {
                let value = Arc::new(value);
                if latest {
                    entry.value = Some(value.clone() as Stored);
                    entry.fetched_at = Some(Instant::now());
                    // An invalidation during the flight keeps the entry stale.
                    entry.stale = entry.generation != generation;
                    entry.error = None;
                    entry.seq_applied = seq;
                } else {
                    debug!(key = %key, seq, latest = entry.seq_issued,
                        "discarding superseded fetch result");
                }
                if entry
                    .flight
                    .as_ref()
                    .is_some_and(|flight| flight.seq == seq)
                {
                    entry.flight = None;
                }
                Ok(value)
            }
            Err(err) => {
                if latest {
                    warn!(key = %key, seq, error = %err, "resource fetch failed");
                    entry.error = Some(err.clone());
                }
                if entry
                    .flight
                    .as_ref()
                    .is_some_and(|flight| flight.seq == seq)
                {
                    entry.flight = None;
                }
                Err(CacheError::Fetch(err))
            }
        }
    }

    /// Snapshot of the tri-state exposed for `key`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::TypeMismatch` if the entry holds a value of a
    /// different type than requested.
    pub fn state<T>(&self, key: &ResourceKey) -> Result<ResourceState<T>, CacheError>
    where
        T: Send + Sync + 'static,
    {
        let entries = self.inner.entries.lock().expect("cache lock poisoned");
        let Some(entry) = entries.get(key) else {
            return Ok(ResourceState::Loading);
        };

        let data = match &entry.value {
            Some(stored) => Some(Arc::clone(stored).downcast::<T>().map_err(|_| {
                CacheError::TypeMismatch {
                    key: key.to_string(),
                }
            })?),
            None => None,
        };

        if entry.flight.is_some() {
            return Ok(match data {
                Some(data) => ResourceState::Refreshing(data),
                None => ResourceState::Loading,
            });
        }
        if let Some(err) = &entry.error {
            return Ok(ResourceState::Failed(err.clone()));
        }
        Ok(match data {
            Some(data) if entry.stale => ResourceState::Refreshing(data),
            Some(data) => ResourceState::Ready(data),
            None => ResourceState::Loading,
        })
    }

    /// Marks every entry of resource `name` stale, across all parameter
    /// combinations. Coarse on purpose: under-invalidating shows users
    /// stale counts, over-invalidating only costs a refetch.
    pub fn invalidate(&self, name: &str) {
        let mut entries = self.inner.entries.lock().expect("cache lock poisoned");
        let mut marked = 0usize;
        for (key, entry) in entries.iter_mut() {
            if key.name() == name {
                entry.stale = true;
                entry.generation += 1;
                marked += 1;
            }
        }
        debug!(name, marked, "invalidated resource entries");
    }

    /// Marks a single entry stale.
    pub fn invalidate_key(&self, key: &ResourceKey) {
        let mut entries = self.inner.entries.lock().expect("cache lock poisoned");
        if let Some(entry) = entries.get_mut(key) {
            entry.stale = true;
            entry.generation += 1;
        }
    }

    /// Drops every entry. Used on sign-out.
    pub fn clear(&self) {
        let mut entries = self.inner.entries.lock().expect("cache lock poisoned");
        entries.clear();
    }

    /// Registers interest in `key`, protecting its entry from [`gc`].
    ///
    /// [`gc`]: ResourceCache::gc
    pub fn subscribe(&self, key: &ResourceKey) -> Subscription {
        let mut entries = self.inner.entries.lock().expect("cache lock poisoned");
        let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
        entry.subscribers += 1;
        entry.idle_since = None;
        Subscription {
            inner: Arc::clone(&self.inner),
            key: key.clone(),
        }
    }

    /// Evicts entries that have had no subscriber for at least
    /// `retention` and have no flight running.
    pub fn gc(&self, retention: Duration) {
        let mut entries = self.inner.entries.lock().expect("cache lock poisoned");
        let before = entries.len();
        entries.retain(|_, entry| {
            entry.subscribers > 0
                || entry.flight.is_some()
                || entry
                    .idle_since
                    .map_or(true, |idle| idle.elapsed() < retention)
        });
        let evicted = before - entries.len();
        if evicted > 0 {
            debug!(evicted, "garbage-collected cache entries");
        }
    }

    /// Number of live entries, for diagnostics.
    pub fn entry_count(&self) -> usize {
        self.inner.entries.lock().expect("cache lock poisoned").len()
    }
}

fn is_fresh(fetched_at: Instant, freshness: Freshness) -> bool {
    match freshness {
        Freshness::FreshFor(window) => fetched_at.elapsed() <= window,
        Freshness::SessionLong => true,
        Freshness::AlwaysRevalidate => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ErrorKind;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    fn key(page: u32) -> ResourceKey {
        ResourceKey::with_params("patients", &json!({ "page": page })).expect("key")
    }

    fn transport_error() -> ResourceError {
        ResourceError::new(ErrorKind::Transport, "connection refused")
    }

    const FIVE_MINUTES: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn serves_cached_value_within_fresh_window() {
        let cache = ResourceCache::new();
        let calls = AtomicUsize::new(0);
        let key = key(0);

        for _ in 0..3 {
            let value: Arc<String> = cache
                .fetch(&key, Freshness::FreshFor(FIVE_MINUTES), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("page-0".to_owned())
                })
                .await
                .expect("fetch");
            assert_eq!(*value, "page-0");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn keys_built_in_different_field_order_share_one_entry() {
        let cache = ResourceCache::new();
        let calls = AtomicUsize::new(0);

        let a = ResourceKey::with_params("patients", &json!({"page": 0, "name": "ana"}))
            .expect("key");
        let b = ResourceKey::with_params("patients", &json!({"name": "ana", "page": 0}))
            .expect("key");

        let _: Arc<String> = cache
            .fetch(&a, Freshness::FreshFor(FIVE_MINUTES), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("value".to_owned())
            })
            .await
            .expect("fetch");
        let via_b: Arc<String> = cache
            .fetch(&b, Freshness::FreshFor(FIVE_MINUTES), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("other".to_owned())
            })
            .await
            .expect("fetch");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*via_b, "value");
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_fetches_share_one_underlying_call() {
        let cache = ResourceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = key(0);

        let slow_calls = Arc::clone(&calls);
        let first = cache.fetch::<String, _, _>(&key, Freshness::AlwaysRevalidate, || async move {
            slow_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok("shared".to_owned())
        });
        let join_calls = Arc::clone(&calls);
        let second = cache.fetch::<String, _, _>(&key, Freshness::AlwaysRevalidate, || async move {
            join_calls.fetch_add(1, Ordering::SeqCst);
            Ok("duplicate".to_owned())
        });

        let (a, b) = tokio::join!(first, second);
        let a = a.expect("first fetch");
        let b = b.expect("second fetch");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*a, "shared");
        assert_eq!(*b, "shared");
    }

    #[tokio::test]
    async fn invalidation_forces_a_refetch() {
        let cache = ResourceCache::new();
        let calls = AtomicUsize::new(0);
        let key = key(0);

        let fetch = |label: &'static str| {
            cache.fetch::<String, _, _>(&key, Freshness::FreshFor(FIVE_MINUTES), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(label.to_owned())
            })
        };

        let before = fetch("before").await.expect("fetch");
        assert_eq!(*before, "before");

        cache.invalidate("patients");

        let after = fetch("after").await.expect("fetch");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*after, "after");
    }

    #[tokio::test]
    async fn invalidation_only_touches_the_named_resource() {
        let cache = ResourceCache::new();
        let calls = AtomicUsize::new(0);
        let other = ResourceKey::new("popups");

        let fetch = || {
            cache.fetch::<String, _, _>(&other, Freshness::FreshFor(FIVE_MINUTES), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("popups".to_owned())
            })
        };

        fetch().await.expect("fetch");
        cache.invalidate("patients");
        fetch().await.expect("fetch");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_result_is_discarded() {
        let cache = ResourceCache::new();
        let key = key(0);
        let (release_old, gate) = oneshot::channel::<()>();

        // Request A: issued first, resolves last.
        let old_cache = cache.clone();
        let old_key = key.clone();
        let old = tokio::spawn(async move {
            old_cache
                .fetch::<String, _, _>(&old_key, Freshness::AlwaysRevalidate, || async move {
                    let _ = gate.await;
                    Ok("old".to_owned())
                })
                .await
        });
        tokio::task::yield_now().await;

        // Invalidate so request B supersedes instead of joining A.
        cache.invalidate("patients");

        let new = cache
            .fetch::<String, _, _>(&key, Freshness::AlwaysRevalidate, || async {
                Ok("new".to_owned())
            })
            .await
            .expect("new fetch");
        assert_eq!(*new, "new");

        // Let A finish after B has already been applied.
        release_old.send(()).expect("release old fetch");
        let old = old.await.expect("join").expect("old fetch");
        // A's awaiter still gets A's data...
        assert_eq!(*old, "old");

        // ...but the cache keeps B's.
        let cached = cache
            .fetch::<String, _, _>(&key, Freshness::FreshFor(FIVE_MINUTES), || async {
                Ok("unexpected refetch".to_owned())
            })
            .await
            .expect("cached fetch");
        assert_eq!(*cached, "new");
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_window_expires() {
        let cache = ResourceCache::new();
        let calls = AtomicUsize::new(0);
        let key = key(0);

        let fetch = || {
            cache.fetch::<String, _, _>(&key, Freshness::FreshFor(FIVE_MINUTES), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("value".to_owned())
            })
        };

        fetch().await.expect("fetch");
        tokio::time::advance(Duration::from_secs(60)).await;
        fetch().await.expect("fetch");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(FIVE_MINUTES).await;
        fetch().await.expect("fetch");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn session_long_resources_never_go_stale_on_their_own() {
        let cache = ResourceCache::new();
        let calls = AtomicUsize::new(0);
        let key = ResourceKey::new("profile");

        let fetch = || {
            cache.fetch::<String, _, _>(&key, Freshness::SessionLong, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("me".to_owned())
            })
        };

        fetch().await.expect("fetch");
        tokio::time::advance(Duration::from_secs(60 * 60 * 24)).await;
        fetch().await.expect("fetch");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn always_revalidate_refetches_every_read() {
        let cache = ResourceCache::new();
        let calls = AtomicUsize::new(0);
        let key = ResourceKey::new("age-metrics");

        for _ in 0..2 {
            let _: Arc<String> = cache
                .fetch(&key, Freshness::AlwaysRevalidate, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("series".to_owned())
                })
                .await
                .expect("fetch");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn tri_state_transitions() {
        let cache = ResourceCache::new();
        let key = key(0);

        assert!(cache.state::<String>(&key).expect("state").is_loading());

        let _: Arc<String> = cache
            .fetch(&key, Freshness::FreshFor(FIVE_MINUTES), || async {
                Ok("value".to_owned())
            })
            .await
            .expect("fetch");
        assert!(matches!(
            cache.state::<String>(&key).expect("state"),
            ResourceState::Ready(_)
        ));

        cache.invalidate("patients");
        match cache.state::<String>(&key).expect("state") {
            ResourceState::Refreshing(data) => assert_eq!(*data, "value"),
            other => panic!("expected Refreshing, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_fetch_records_the_error_and_recovers() {
        let cache = ResourceCache::new();
        let key = key(0);

        let err = cache
            .fetch::<String, _, _>(&key, Freshness::AlwaysRevalidate, || async {
                Err(transport_error())
            })
            .await
            .expect_err("fetch should fail");
        match err {
            CacheError::Fetch(err) => assert_eq!(err.kind, ErrorKind::Transport),
            other => panic!("expected Fetch error, got {other}"),
        }
        assert!(matches!(
            cache.state::<String>(&key).expect("state"),
            ResourceState::Failed(_)
        ));

        let value: Arc<String> = cache
            .fetch(&key, Freshness::AlwaysRevalidate, || async {
                Ok("recovered".to_owned())
            })
            .await
            .expect("fetch");
        assert_eq!(*value, "recovered");
        assert!(matches!(
            cache.state::<String>(&key).expect("state"),
            ResourceState::Ready(_)
        ));
    }

    #[tokio::test]
    async fn mismatched_type_is_a_hard_error() {
        let cache = ResourceCache::new();
        let key = key(0);

        let _: Arc<String> = cache
            .fetch(&key, Freshness::FreshFor(FIVE_MINUTES), || async {
                Ok("text".to_owned())
            })
            .await
            .expect("fetch");

        let err = cache
            .fetch::<u32, _, _>(&key, Freshness::FreshFor(FIVE_MINUTES), || async { Ok(7) })
            .await
            .expect_err("should refuse to downcast");
        assert!(matches!(err, CacheError::TypeMismatch { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn gc_evicts_only_unsubscribed_idle_entries() {
        let cache = ResourceCache::new();
        let watched = key(0);
        let abandoned = key(1);

        for k in [&watched, &abandoned] {
            let _: Arc<String> = cache
                .fetch(k, Freshness::FreshFor(FIVE_MINUTES), || async {
                    Ok("value".to_owned())
                })
                .await
                .expect("fetch");
        }
        let guard = cache.subscribe(&watched);

        tokio::time::advance(Duration::from_secs(600)).await;
        cache.gc(Duration::from_secs(300));
        assert_eq!(cache.entry_count(), 1);

        drop(guard);
        tokio::time::advance(Duration::from_secs(600)).await;
        cache.gc(Duration::from_secs(300));
        assert_eq!(cache.entry_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_fetch_releases_the_key() {
        let cache = ResourceCache::new();
        let key = key(0);

        let cancelled = tokio::time::timeout(
            Duration::from_millis(50),
            cache.fetch::<String, _, _>(&key, Freshness::AlwaysRevalidate, || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok("never".to_owned())
            }),
        )
        .await;
        assert!(cancelled.is_err());

        // The key must be free again: a later read issues its own fetch.
        let value: Arc<String> = cache
            .fetch(&key, Freshness::AlwaysRevalidate, || async {
                Ok("after".to_owned())
            })
            .await
            .expect("fetch after cancellation");
        assert_eq!(*value, "after");
    }

    #[tokio::test(start_paused = true)]
    async fn joiner_recovers_when_the_running_fetch_is_cancelled() {
        let cache = ResourceCache::new();
        let key = key(0);

        let runner_cache = cache.clone();
        let runner_key = key.clone();
        let runner = tokio::spawn(async move {
            runner_cache
                .fetch::<String, _, _>(&runner_key, Freshness::AlwaysRevalidate, || async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok("never".to_owned())
                })
                .await
        });
        tokio::task::yield_now().await;

        let joiner_cache = cache.clone();
        let joiner_key = key.clone();
        let joiner = tokio::spawn(async move {
            joiner_cache
                .fetch::<String, _, _>(&joiner_key, Freshness::AlwaysRevalidate, || async {
                    Ok("fallback".to_owned())
                })
                .await
        });
        tokio::task::yield_now().await;

        runner.abort();

        let value = joiner
            .await
            .expect("joiner task")
            .expect("fetch after the runner vanished");
        assert_eq!(*value, "fallback");
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let cache = ResourceCache::new();
        let key = key(0);

        let _: Arc<String> = cache
            .fetch(&key, Freshness::FreshFor(FIVE_MINUTES), || async {
                Ok("value".to_owned())
            })
            .await
            .expect("fetch");
        cache.clear();

        assert_eq!(cache.entry_count(), 0);
        assert!(cache.state::<String>(&key).expect("state").is_loading());
    }
}
