//! Query Cache
//!
//! Fingerprint-keyed cache sitting between the catalog and the upstream
//! gateway. Each fingerprint holds at most one ready value and at most one
//! in-flight fetch:
//!
//! - a read inside the staleness window returns the ready value
//! - a read outside it starts a fetch, or joins the one already running
//! - every fetch carries a generation; a completion is written back only if
//!   its fingerprint still points at that generation
//! - failures are handed to every waiter and never stored
//!
//! The slot map sits behind a `std::sync::Mutex` that is never held across
//! an `.await`. In-flight fetches are `futures::future::Shared`, so any
//! number of readers can await the same network call.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use tokio::time::Instant;
use url::form_urlencoded;

use crate::error::UpstreamError;

// ============================================================================
// FINGERPRINTS AND STALENESS
// ============================================================================

/// Cache key: endpoint plus serialized query parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// `places:list` + `[("name", "bar")]` -> `places:list?name=bar`
    ///
    /// Keys and values are form-urlencoded, so a value can never spell
    /// another parameter.
    pub fn new(endpoint: &str, params: &[(&str, &str)]) -> Self {
        if params.is_empty() {
            return Self(endpoint.to_string());
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        Self(format!("{}?{}", endpoint, query))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-prefix staleness windows; the longest matching prefix wins
#[derive(Debug, Clone, PartialEq)]
pub struct StalenessPolicy {
    default: Duration,
    rules: Vec<(String, Duration)>,
}

impl StalenessPolicy {
    pub fn new(default: Duration) -> Self {
        Self {
            default,
            rules: Vec::new(),
        }
    }

    pub fn with_default(mut self, default: Duration) -> Self {
        self.default = default;
        self
    }

    pub fn with_rule(mut self, prefix: impl Into<String>, window: Duration) -> Self {
        let prefix = prefix.into();
        self.rules.retain(|(p, _)| *p != prefix);
        self.rules.push((prefix, window));
        self
    }

    pub fn stale_time(&self, fingerprint: &Fingerprint) -> Duration {
        self.rules
            .iter()
            .filter(|(prefix, _)| fingerprint.as_str().starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, window)| *window)
            .unwrap_or(self.default)
    }
}

impl Default for StalenessPolicy {
    /// Types change rarely, category lists occasionally, searches often.
    /// The unfiltered list is always refetched when read again.
    fn default() -> Self {
        StalenessPolicy::new(Duration::ZERO)
            .with_rule("places:types", Duration::from_secs(10 * 60))
            .with_rule("places:list?type=", Duration::from_secs(5 * 60))
            .with_rule("places:list?name=", Duration::from_secs(2 * 60))
    }
}

// ============================================================================
// SLOTS
// ============================================================================

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, UpstreamError>>>;

struct Ready<V> {
    data: V,
    fetched_at: Instant,
    fetched_at_utc: DateTime<Utc>,
    generation: u64,
}

struct Pending<V> {
    fetch: SharedFetch<V>,
    generation: u64,
}

struct Slot<V> {
    ready: Option<Ready<V>>,
    pending: Option<Pending<V>>,
}

enum Lookup<V> {
    Fresh(V),
    InFlight(SharedFetch<V>),
    Miss(u64),
}

struct Inner<V> {
    slots: Mutex<HashMap<String, Slot<V>>>,
    policy: StalenessPolicy,
    generation: AtomicU64,
}

impl<V> Inner<V> {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot<V>>> {
        // A panic while holding the lock leaves the map structurally valid
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<V: Clone> Inner<V> {
    /// Write a finished fetch back, unless it was invalidated or superseded
    fn complete(&self, key: &str, generation: u64, result: &Result<V, UpstreamError>) {
        let mut slots = self.lock();
        let Some(slot) = slots.get_mut(key) else {
            tracing::debug!(fingerprint = key, generation, "Discarding completion of invalidated fetch");
            return;
        };
        if slot.pending.as_ref().map(|p| p.generation) != Some(generation) {
            tracing::debug!(fingerprint = key, generation, "Discarding completion of superseded fetch");
            return;
        }
        slot.pending = None;

        match result {
            Ok(data) => {
                slot.ready = Some(Ready {
                    data: data.clone(),
                    fetched_at: Instant::now(),
                    fetched_at_utc: Utc::now(),
                    generation,
                });
            }
            Err(e) => {
                tracing::debug!(fingerprint = key, generation, error = %e, "Fetch failed, not cached");
                if slot.ready.is_none() {
                    slots.remove(key);
                }
            }
        }
    }
}

/// Cache status of one fingerprint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatus {
    /// When the ready value was stored; `None` while the first fetch runs
    pub fetched_at: Option<DateTime<Utc>>,
    pub generation: Option<u64>,
    pub stale: bool,
    pub pending: bool,
}

// ============================================================================
// QUERY CACHE
// ============================================================================

/// Cloneable handle to a shared fingerprint-keyed cache
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

impl<V: Clone + Send + Sync + 'static> Default for QueryCache<V> {
    fn default() -> Self {
        Self::new(StalenessPolicy::default())
    }
}

impl<V: Clone + Send + Sync + 'static> QueryCache<V> {
    pub fn new(policy: StalenessPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(HashMap::new()),
                policy,
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn policy(&self) -> &StalenessPolicy {
        &self.inner.policy
    }

    /// Return the cached value if fresh, otherwise fetch (or join the fetch in flight)
    ///
    /// `fetch` is called without the cache lock held, so it may read this
    /// cache. Its future is only polled when it becomes the fetch in flight.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        fingerprint: &Fingerprint,
        fetch: F,
    ) -> Result<V, UpstreamError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, UpstreamError>> + Send + 'static,
    {
        let key = fingerprint.as_str();

        let generation = match self.lookup(fingerprint) {
            Lookup::Fresh(data) => return Ok(data),
            Lookup::InFlight(shared) => return shared.await,
            Lookup::Miss(generation) => generation,
        };

        let candidate = Self::shared_fetch(
            Arc::downgrade(&self.inner),
            key.to_string(),
            generation,
            fetch(),
        );

        let shared = {
            let mut slots = self.inner.lock();
            let slot = slots.entry(key.to_string()).or_insert_with(|| Slot {
                ready: None,
                pending: None,
            });
            match &slot.pending {
                Some(pending) => {
                    // another reader installed its fetch first; ours is dropped unpolled
                    tracing::trace!(fingerprint = key, generation = pending.generation, "Joining in-flight fetch");
                    pending.fetch.clone()
                }
                None => {
                    tracing::debug!(fingerprint = key, generation, "Cache miss, fetching");
                    slot.pending = Some(Pending {
                        fetch: candidate.clone(),
                        generation,
                    });
                    candidate
                }
            }
        };

        shared.await
    }

    fn lookup(&self, fingerprint: &Fingerprint) -> Lookup<V> {
        let key = fingerprint.as_str();
        let window = self.inner.policy.stale_time(fingerprint);
        let slots = self.inner.lock();

        if let Some(slot) = slots.get(key) {
            if let Some(ready) = &slot.ready {
                if ready.fetched_at.elapsed() < window {
                    tracing::trace!(fingerprint = key, "Cache hit");
                    return Lookup::Fresh(ready.data.clone());
                }
            }
            if let Some(pending) = &slot.pending {
                tracing::trace!(fingerprint = key, generation = pending.generation, "Joining in-flight fetch");
                return Lookup::InFlight(pending.fetch.clone());
            }
        }
        Lookup::Miss(self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn shared_fetch<Fut>(
        inner: Weak<Inner<V>>,
        key: String,
        generation: u64,
        fetch: Fut,
    ) -> SharedFetch<V>
    where
        Fut: Future<Output = Result<V, UpstreamError>> + Send + 'static,
    {
        async move {
            let result = fetch.await;
            // The cache may already be gone; waiters still get the result
            if let Some(inner) = inner.upgrade() {
                inner.complete(&key, generation, &result);
            }
            result
        }
        .boxed()
        .shared()
    }

    /// Drop every entry whose fingerprint starts with `prefix`. Returns how many.
    ///
    /// Fetches already in flight still resolve for their waiters but are not stored.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut slots = self.inner.lock();
        let before = slots.len();
        slots.retain(|key, _| !key.starts_with(prefix));
        let removed = before - slots.len();
        tracing::debug!(prefix, removed, "Cache invalidated");
        removed
    }

    /// Ready value, fresh or stale, without fetching
    pub fn peek(&self, fingerprint: &Fingerprint) -> Option<V> {
        self.inner
            .lock()
            .get(fingerprint.as_str())
            .and_then(|slot| slot.ready.as_ref())
            .map(|ready| ready.data.clone())
    }

    pub fn status(&self, fingerprint: &Fingerprint) -> Option<CacheStatus> {
        let window = self.inner.policy.stale_time(fingerprint);
        let slots = self.inner.lock();
        let slot = slots.get(fingerprint.as_str())?;
        Some(CacheStatus {
            fetched_at: slot.ready.as_ref().map(|r| r.fetched_at_utc),
            generation: slot.ready.as_ref().map(|r| r.generation),
            stale: slot
                .ready
                .as_ref()
                .map_or(true, |r| r.fetched_at.elapsed() >= window),
            pending: slot.pending.is_some(),
        })
    }

    /// Number of fingerprints with a ready value or a fetch in flight
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
