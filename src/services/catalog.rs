use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{sleep, timeout, Instant};

use crate::config::{
    GC_TIME_SECS, MAX_RETRIES, REQUEST_TIMEOUT_MS, RETRY_DELAY_CAP_MS, RETRY_DELAY_STEP_MS,
    STALE_TIME_SECS,
};
use crate::errors::FetchError;
use crate::models::{CacheEntry, CacheStatus, CatalogItem, CatalogPayload};
use crate::services::{CatalogTransport, RateLimiter};

pub type Catalog = Arc<Vec<CatalogItem>>;

/// Timing knobs for catalog fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPolicy {
    pub request_timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub retry_delay_step: Duration,
    pub retry_delay_cap: Duration,
    /// How long a successful payload is served without refetching.
    pub stale_time: Duration,
    /// How long an unobserved entry is kept before eviction.
    pub gc_time: Duration,
}

impl FetchPolicy {
    /// Linear backoff after the given (1-based) failed attempt.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        (self.retry_delay_step * attempt).min(self.retry_delay_cap)
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(REQUEST_TIMEOUT_MS),
            max_retries: MAX_RETRIES,
            retry_delay_step: Duration::from_millis(RETRY_DELAY_STEP_MS),
            retry_delay_cap: Duration::from_millis(RETRY_DELAY_CAP_MS),
            stale_time: Duration::from_secs(STALE_TIME_SECS),
            gc_time: Duration::from_secs(GC_TIME_SECS),
        }
    }
}

enum Lookup {
    Hit(Catalog),
    StaleHit(Catalog),
    Miss { generation: u64 },
}

struct Inner<T> {
    transport: T,
    limiter: Arc<RateLimiter>,
    url: String,
    policy: FetchPolicy,
    entry: Mutex<CacheEntry>,
    // Held for the whole duration of a fetch sequence; at most one runs at a time.
    fetch_gate: Arc<AsyncMutex<()>>,
}

/// Cached, rate-limited, retried access to the remote catalog.
///
/// Fresh payloads are served with no network traffic. Stale payloads are
/// served immediately while a single background refresh runs. Concurrent
/// misses share one fetch and all observe its outcome.
pub struct RemoteResourceCache<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for RemoteResourceCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: CatalogTransport> RemoteResourceCache<T> {
    pub fn new(
        transport: T,
        limiter: Arc<RateLimiter>,
        url: impl Into<String>,
        policy: FetchPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                limiter,
                url: url.into(),
                policy,
                entry: Mutex::new(CacheEntry::new()),
                fetch_gate: Arc::new(AsyncMutex::new(())),
            }),
        }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.inner.policy
    }

    pub async fn fetch_catalog(&self) -> Result<Catalog, FetchError> {
        let seen_generation = match self.inner.lookup(Instant::now()) {
            Lookup::Hit(items) => {
                tracing::debug!(count = items.len(), "catalog served from cache");
                return Ok(items);
            }
            Lookup::StaleHit(items) => {
                tracing::debug!(count = items.len(), "serving stale catalog");
                self.spawn_refresh();
                return Ok(items);
            }
            Lookup::Miss { generation } => generation,
        };

        // The fetch runs detached so a caller that goes away mid-flight does not
        // cancel the sequence the other waiters are queued behind.
        let inner = Arc::clone(&self.inner);
        let shared = tokio::spawn(async move { inner.fetch_shared(seen_generation).await });

        match shared.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "catalog fetch task failed");
                Err(FetchError::Network(e.to_string()))
            }
        }
    }

    /// Returns the cached payload if one is present, without fetching.
    pub fn get_cached(&self) -> Option<Catalog> {
        match self.inner.lookup(Instant::now()) {
            Lookup::Hit(items) | Lookup::StaleHit(items) => Some(items),
            Lookup::Miss { .. } => None,
        }
    }

    pub fn status(&self) -> CacheStatus {
        let now = Instant::now();
        let mut entry = self.inner.entry();
        self.inner.evict_if_expired(&mut entry, now);
        self.inner.effective_status(&entry, now)
    }

    /// Attempt number of the in-flight fetch, 0 when idle.
    pub fn current_attempt(&self) -> u32 {
        self.inner.entry().attempt
    }

    /// Mark the current payload stale so the next request refreshes it.
    pub fn invalidate(&self) {
        self.inner.entry().invalidated = true;
    }

    /// Drop the entry if its retention window has lapsed with no observers.
    pub fn evict_expired(&self) -> bool {
        let mut entry = self.inner.entry();
        self.inner.evict_if_expired(&mut entry, Instant::now())
    }

    /// Register an active consumer. The retention window starts once the last
    /// subscription is dropped.
    pub fn subscribe(&self) -> CatalogSubscription<T> {
        let mut entry = self.inner.entry();
        entry.observers += 1;
        entry.idle_since = None;
        CatalogSubscription {
            inner: Arc::clone(&self.inner),
        }
    }

    fn spawn_refresh(&self) {
        let Ok(gate) = Arc::clone(&self.inner.fetch_gate).try_lock_owned() else {
            return;
        };
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let _gate = gate;
            if let Err(e) = inner.run_fetch().await {
                tracing::warn!(error = %e, "background catalog refresh failed");
            }
        });
    }
}

impl<T> Inner<T> {
    fn entry(&self) -> MutexGuard<'_, CacheEntry> {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, now: Instant) -> Lookup {
        let mut entry = self.entry();
        self.evict_if_expired(&mut entry, now);

        match (self.effective_status(&entry, now), &entry.payload) {
            (CacheStatus::Fresh, Some(items)) => Lookup::Hit(Arc::clone(items)),
            (CacheStatus::Stale | CacheStatus::Loading | CacheStatus::Error, Some(items)) => {
                Lookup::StaleHit(Arc::clone(items))
            }
            _ => Lookup::Miss {
                generation: entry.generation,
            },
        }
    }

    fn effective_status(&self, entry: &CacheEntry, now: Instant) -> CacheStatus {
        match (entry.status, entry.fetched_at) {
            (CacheStatus::Fresh, Some(fetched_at))
                if entry.invalidated
                    || now.saturating_duration_since(fetched_at) >= self.policy.stale_time =>
            {
                CacheStatus::Stale
            }
            (status, _) => status,
        }
    }

    fn evict_if_expired(&self, entry: &mut CacheEntry, now: Instant) -> bool {
        let expired = entry.observers == 0
            && entry.status != CacheStatus::Loading
            && entry.status != CacheStatus::Empty
            && entry
                .idle_since
                .is_some_and(|idle| now.saturating_duration_since(idle) >= self.policy.gc_time);

        if expired {
            tracing::debug!("evicting unobserved catalog entry");
            *entry = CacheEntry {
                generation: entry.generation,
                ..CacheEntry::new()
            };
        }
        expired
    }
}

impl<T: CatalogTransport> Inner<T> {
    /// Waits for any in-flight fetch, then reuses its outcome or starts a new one.
    async fn fetch_shared(&self, seen_generation: u64) -> Result<Catalog, FetchError> {
        let _gate = self.fetch_gate.lock().await;

        // Another caller may have finished a fetch while we waited.
        {
            let entry = self.entry();
            if entry.generation != seen_generation {
                match (&entry.error, &entry.payload) {
                    (Some(error), _) => return Err(error.clone()),
                    (None, Some(items)) => return Ok(Arc::clone(items)),
                    (None, None) => {}
                }
            }
        }

        self.run_fetch().await
    }

    /// Runs one fetch sequence and records its outcome. Callers hold `fetch_gate`.
    async fn run_fetch(&self) -> Result<Catalog, FetchError> {
        {
            let mut entry = self.entry();
            entry.status = CacheStatus::Loading;
            entry.attempt = 0;
        }

        let result = self.fetch_with_retry().await.map(Arc::new);

        let now = Instant::now();
        let mut entry = self.entry();
        entry.generation += 1;
        entry.attempt = 0;
        match &result {
            Ok(items) => self.cache_response(&mut entry, Arc::clone(items), now),
            Err(error) => {
                entry.status = CacheStatus::Error;
                entry.error = Some(error.clone());
            }
        }
        result
    }

    fn cache_response(&self, entry: &mut CacheEntry, items: Catalog, now: Instant) {
        entry.status = CacheStatus::Fresh;
        entry.payload = Some(items);
        entry.fetched_at = Some(now);
        entry.error = None;
        entry.invalidated = false;
        if entry.observers == 0 {
            entry.idle_since = Some(now);
        }
    }

    async fn fetch_with_retry(&self) -> Result<Vec<CatalogItem>, FetchError> {
        // One permit covers the whole retry sequence.
        self.limiter.try_acquire().map_err(|e| {
            tracing::warn!(retry_after = ?e.retry_after, "catalog fetch rate limited");
            FetchError::from(e)
        })?;

        let mut attempt = 1;
        loop {
            self.entry().attempt = attempt;

            match self.fetch_once().await {
                Ok(items) => {
                    tracing::info!(count = items.len(), attempt, "fetched catalog");
                    return Ok(items);
                }
                Err(error) if error.is_retryable() && attempt <= self.policy.max_retries => {
                    let delay = self.policy.retry_delay(attempt);
                    tracing::warn!(attempt, ?delay, %error, "catalog fetch failed, retrying");
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    tracing::warn!(attempt, %error, "catalog fetch failed");
                    return Err(error);
                }
            }
        }
    }

    async fn fetch_once(&self) -> Result<Vec<CatalogItem>, FetchError> {
        // Dropping the request future on timeout cancels it; its late result is never seen.
        let response = match timeout(self.policy.request_timeout, self.transport.get(&self.url)).await {
            Ok(result) => result?,
            Err(_) => return Err(FetchError::Timeout),
        };

        if !response.status.is_success() {
            return Err(FetchError::Status(response.status));
        }

        CatalogPayload::parse(&response.body)
    }
}

/// Active-consumer handle returned by [`RemoteResourceCache::subscribe`].
pub struct CatalogSubscription<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Drop for CatalogSubscription<T> {
    fn drop(&mut self) {
        let mut entry = self.inner.entry();
        entry.observers = entry.observers.saturating_sub(1);
        if entry.observers == 0 {
            entry.idle_since = Some(Instant::now());
        }
    }
}
