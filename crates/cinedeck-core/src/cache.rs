//! Keyed, staleness-aware query cache with single-flight fetches.
//!
//! Every read goes through [`QueryCache::get`], which answers from the cache
//! when the entry is fresh, serves the old value while revalidating in the
//! background when it is stale, and otherwise starts (or joins) the one
//! in-flight fetch for the key. The cache is an explicitly owned handle:
//! clone it to share it between controllers, call [`QueryCache::clear`] to
//! reset it.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use cinedeck_api::CatalogError;
use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::key::{RequestKey, ResourceKind};

/// Default number of entries kept before the least recently used is evicted.
pub const DEFAULT_CAPACITY: usize = 512;

/// Default upper bound on a single fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub type FetchResult<V> = Result<Arc<V>, CatalogError>;

/// A fetch that any number of callers can await; all observe the same result.
pub type SharedFetch<V> = Shared<BoxFuture<'static, FetchResult<V>>>;

/// Freshness and sizing rules for a cache.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    ttls: HashMap<ResourceKind, Duration>,
    /// Maximum number of entries; `0` disables eviction.
    pub capacity: usize,
    /// Fetches running longer than this resolve as [`CatalogError::Timeout`].
    pub fetch_timeout: Option<Duration>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttls: HashMap::new(),
            capacity: DEFAULT_CAPACITY,
            fetch_timeout: Some(DEFAULT_FETCH_TIMEOUT),
        }
    }
}

impl CachePolicy {
    /// Time-to-live for a resource kind.
    pub fn ttl_for(&self, kind: ResourceKind) -> Duration {
        self.ttls
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_ttl())
    }

    pub fn with_ttl(mut self, kind: ResourceKind, ttl: Duration) -> Self {
        self.ttls.insert(kind, ttl);
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

/// Lifecycle status of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Nothing has been requested for this key.
    Idle,
    /// First fetch in progress; no value yet.
    Loading,
    Fresh,
    /// Value is past its time-to-live (or its revalidation failed).
    Stale,
    /// Last fetch failed and there is no value to fall back to.
    Error,
}

/// Result of a cache read.
pub enum Lookup<V> {
    /// Served from cache; no network involved.
    Fresh(Arc<V>),
    /// Served from cache past its TTL; a background revalidation is running.
    Stale(Arc<V>),
    /// No value yet; await the in-flight fetch.
    Pending(SharedFetch<V>),
}

impl<V> Lookup<V> {
    /// The value available right now, if any.
    pub fn value(&self) -> Option<&Arc<V>> {
        match self {
            Self::Fresh(v) | Self::Stale(v) => Some(v),
            Self::Pending(_) => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Wait for a value, joining the in-flight fetch if there is one.
    pub async fn resolve(self) -> FetchResult<V> {
        match self {
            Self::Fresh(v) | Self::Stale(v) => Ok(v),
            Self::Pending(fetch) => fetch.await,
        }
    }
}

impl<V> fmt::Debug for Lookup<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fresh(_) => f.write_str("Lookup::Fresh"),
            Self::Stale(_) => f.write_str("Lookup::Stale"),
            Self::Pending(_) => f.write_str("Lookup::Pending"),
        }
    }
}

/// Read-only view of an entry for the presentation layer.
#[derive(Debug)]
pub struct EntrySnapshot<V> {
    pub key: RequestKey,
    pub status: CacheStatus,
    pub value: Option<Arc<V>>,
    pub fetched_at: Option<Instant>,
    pub error: Option<CatalogError>,
    pub ttl: Duration,
    pub in_flight: bool,
}

impl<V> Clone for EntrySnapshot<V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            status: self.status,
            value: self.value.clone(),
            fetched_at: self.fetched_at,
            error: self.error.clone(),
            ttl: self.ttl,
            in_flight: self.in_flight,
        }
    }
}

type Request<V> = BoxFuture<'static, Result<V, CatalogError>>;

struct Flight<V> {
    id: u64,
    future: SharedFetch<V>,
}

/// A registered flight still waiting for its request future.
///
/// Handed out while the lock is held and completed after it is released, so
/// a fetcher is free to read the cache itself.
#[must_use]
struct Launch<V> {
    request: oneshot::Sender<Request<V>>,
}

impl<V> Launch<V> {
    fn start<F, Fut>(self, fetcher: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, CatalogError>> + Send + 'static,
    {
        // The receiver lives in a spawned task that only ends after reading it.
        let _ = self.request.send(fetcher().boxed());
    }
}

struct Entry<V> {
    status: CacheStatus,
    value: Option<Arc<V>>,
    fetched_at: Option<Instant>,
    error: Option<CatalogError>,
    ttl: Duration,
}

impl<V> Entry<V> {
    fn loading(ttl: Duration) -> Self {
        Self {
            status: CacheStatus::Loading,
            value: None,
            fetched_at: None,
            error: None,
            ttl,
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        self.status == CacheStatus::Fresh
            && self
                .fetched_at
                .is_some_and(|at| now.saturating_duration_since(at) < self.ttl)
    }

    fn reported_status(&self, now: Instant) -> CacheStatus {
        if self.status == CacheStatus::Fresh && !self.is_fresh(now) {
            CacheStatus::Stale
        } else {
            self.status
        }
    }
}

/// Cached entries and running fetches.
///
/// Flights are kept outside the LRU so that evicting an entry never loses
/// track of the request still running for its key.
struct State<V> {
    entries: LruCache<RequestKey, Entry<V>>,
    flights: HashMap<RequestKey, Flight<V>>,
}

impl<V> State<V> {
    /// Insert or replace an entry, logging whatever the LRU pushes out.
    fn store(&mut self, key: RequestKey, entry: Entry<V>) {
        if let Some((evicted, _)) = self.entries.push(key.clone(), entry) {
            if evicted != key {
                debug!(key = %evicted, "Evicted least recently used entry");
            }
        }
    }
}

struct Inner<V> {
    state: Mutex<State<V>>,
    policy: CachePolicy,
    next_flight: AtomicU64,
}

impl<V> Inner<V> {
    fn lock(&self) -> MutexGuard<'_, State<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the outcome of a flight on its entry.
    fn complete(&self, key: &RequestKey, flight_id: u64, result: &FetchResult<V>) {
        let mut state = self.lock();
        if state.flights.get(key).map(|f| f.id) != Some(flight_id) {
            debug!(key = %key, "Discarding result of a cleared fetch");
            return;
        }
        state.flights.remove(key);

        let ttl = self.policy.ttl_for(key.kind());
        let mut entry = match state.entries.pop(key) {
            Some(entry) => entry,
            None => {
                debug!(key = %key, "Entry evicted while fetching, storing result");
                Entry::loading(ttl)
            }
        };

        match result {
            Ok(value) => {
                entry.value = Some(Arc::clone(value));
                entry.fetched_at = Some(Instant::now());
                entry.status = CacheStatus::Fresh;
                entry.error = None;
                info!(key = %key, "Fetched");
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Fetch failed");
                entry.error = Some(e.clone());
                // A failed revalidation never discards the value we already have.
                entry.status = if entry.value.is_some() {
                    CacheStatus::Stale
                } else {
                    CacheStatus::Error
                };
            }
        }
        state.store(key.clone(), entry);
    }
}

/// Shared handle to a query cache. Cloning is cheap and yields the same cache.
///
/// Reads that need the network spawn the fetch on the current Tokio runtime,
/// so [`QueryCache::get`] must be called from within one.
pub struct QueryCache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for QueryCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> fmt::Debug for QueryCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("QueryCache")
            .field("len", &state.entries.len())
            .field("in_flight", &state.flights.len())
            .field("policy", &self.inner.policy)
            .finish()
    }
}

impl<V> Default for QueryCache<V>
where
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

impl<V> QueryCache<V>
where
    V: Send + Sync + 'static,
{
    pub fn new(policy: CachePolicy) -> Self {
        let entries = match NonZeroUsize::new(policy.capacity) {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    entries,
                    flights: HashMap::new(),
                }),
                policy,
                next_flight: AtomicU64::new(0),
            }),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.inner.policy
    }

    /// Read `key`, using the policy's TTL for its resource kind.
    ///
    /// `fetcher` is only invoked when a network request is actually needed,
    /// and never while the cache is locked.
    pub fn get<F, Fut>(&self, key: RequestKey, fetcher: F) -> Lookup<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, CatalogError>> + Send + 'static,
    {
        let ttl = self.inner.policy.ttl_for(key.kind());
        self.get_with_ttl(key, ttl, fetcher)
    }

    /// Read `key` with an explicit time-to-live.
    pub fn get_with_ttl<F, Fut>(&self, key: RequestKey, ttl: Duration, fetcher: F) -> Lookup<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, CatalogError>> + Send + 'static,
    {
        let (lookup, launch) = self.lookup(key, ttl);
        if let Some(launch) = launch {
            launch.start(fetcher);
        }
        lookup
    }

    /// Decide how to answer a read, registering a flight when one is needed.
    fn lookup(&self, key: RequestKey, ttl: Duration) -> (Lookup<V>, Option<Launch<V>>) {
        let now = Instant::now();
        let mut state = self.inner.lock();
        let running = state.flights.get(&key).map(|f| f.future.clone());

        if let Some(entry) = state.entries.get_mut(&key) {
            entry.ttl = ttl;

            if let Some(value) = entry.value.clone() {
                if entry.is_fresh(now) {
                    debug!(key = %key, "Cache hit");
                    return (Lookup::Fresh(value), None);
                }
                entry.status = CacheStatus::Stale;
                if running.is_some() {
                    return (Lookup::Stale(value), None);
                }
                debug!(key = %key, "Serving stale value, revalidating");
                let (_, launch) = self.register(&mut state, key);
                return (Lookup::Stale(value), Some(launch));
            }

            if let Some(future) = running {
                debug!(key = %key, "Joining in-flight fetch");
                return (Lookup::Pending(future), None);
            }

            debug!(key = %key, status = ?entry.status, "Retrying fetch");
            entry.status = CacheStatus::Loading;
            entry.error = None;
            let (future, launch) = self.register(&mut state, key);
            return (Lookup::Pending(future), Some(launch));
        }

        if let Some(future) = running {
            debug!(key = %key, "Joining in-flight fetch of an evicted entry");
            state.store(key, Entry::loading(ttl));
            return (Lookup::Pending(future), None);
        }

        debug!(key = %key, "Cache miss");
        state.store(key.clone(), Entry::loading(ttl));
        let (future, launch) = self.register(&mut state, key);
        (Lookup::Pending(future), Some(launch))
    }

    /// Read `key` and wait for a value if none is cached yet.
    pub async fn fetch<F, Fut>(&self, key: RequestKey, fetcher: F) -> FetchResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, CatalogError>> + Send + 'static,
    {
        self.get(key, fetcher).resolve().await
    }

    /// Spawn the flight for `key` and record it. The request itself arrives
    /// through the returned [`Launch`].
    fn register(&self, state: &mut State<V>, key: RequestKey) -> (SharedFetch<V>, Launch<V>) {
        let id = self.inner.next_flight.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::downgrade(&self.inner);
        let timeout = self.inner.policy.fetch_timeout;
        let (tx, rx) = oneshot::channel::<Request<V>>();
        let flight_key = key.clone();

        let future = async move {
            let outcome = match rx.await {
                Ok(request) => match timeout {
                    Some(limit) => tokio::time::timeout(limit, request)
                        .await
                        .unwrap_or_else(|_| Err(CatalogError::Timeout(limit))),
                    None => request.await,
                },
                Err(_) => Err(CatalogError::Network(
                    "fetch abandoned before it started".into(),
                )),
            };
            let result = outcome.map(Arc::new);
            if let Some(inner) = inner.upgrade() {
                inner.complete(&flight_key, id, &result);
            }
            result
        }
        .boxed()
        .shared();

        // Drive the fetch even if every caller stops waiting on it.
        tokio::spawn(future.clone());
        state.flights.insert(
            key,
            Flight {
                id,
                future: future.clone(),
            },
        );
        (future, Launch { request: tx })
    }

    /// Current state of `key` without touching recency or starting a fetch.
    pub fn snapshot(&self, key: &RequestKey) -> EntrySnapshot<V> {
        let now = Instant::now();
        let state = self.inner.lock();
        let in_flight = state.flights.contains_key(key);
        match state.entries.peek(key) {
            Some(entry) => EntrySnapshot {
                key: key.clone(),
                status: entry.reported_status(now),
                value: entry.value.clone(),
                fetched_at: entry.fetched_at,
                error: entry.error.clone(),
                ttl: entry.ttl,
                in_flight,
            },
            None => EntrySnapshot {
                key: key.clone(),
                status: if in_flight {
                    CacheStatus::Loading
                } else {
                    CacheStatus::Idle
                },
                value: None,
                fetched_at: None,
                error: None,
                ttl: self.inner.policy.ttl_for(key.kind()),
                in_flight,
            },
        }
    }

    /// The fetch currently running for `key`, if any.
    pub fn in_flight(&self, key: &RequestKey) -> Option<SharedFetch<V>> {
        self.inner
            .lock()
            .flights
            .get(key)
            .map(|f| f.future.clone())
    }

    /// Mark a cached value stale so the next read revalidates it.
    pub fn invalidate(&self, key: &RequestKey) {
        if let Some(entry) = self.inner.lock().entries.peek_mut(key) {
            if entry.status == CacheStatus::Fresh {
                entry.status = CacheStatus::Stale;
            }
        }
    }

    /// Drop every entry. Fetches still running finish but are not recorded.
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.entries.clear();
        state.flights.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
