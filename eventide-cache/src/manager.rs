//! Cache manager: the get-or-fetch entry point.
//!
//! # Read path
//!
//! 1. Resolve the key's policy.
//! 2. Fresh entry: return it, no fetch.
//! 3. Expired entry under stale-while-revalidate: return it and, if no
//!    refresh is in flight for the key, start one in the background.
//! 4. Otherwise (miss, or expired without stale-while-revalidate): await
//!    the fetch, store the result, return it. A failed fetch is returned
//!    to the caller unchanged and leaves the store untouched.
//!
//! # Thread Safety
//!
//! The entry store and revalidation tracker sit behind a single mutex. The
//! lock is never held across an `.await`.

use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::{debug, debug_span, instrument, warn, Instrument};

use eventide_core::{CacheConfig, CacheError, CacheKey, CachePolicy, Result};

use crate::policy::PolicyResolver;
use crate::stats::{CacheStats, StatsRecorder};
use crate::store::EntryStore;
use crate::sweep::SweepTask;
use crate::tracker::RevalidationTracker;

type AnyValue = Arc<dyn Any + Send + Sync>;

/// How a read was answered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// Served from an entry younger than its TTL
    Fresh,
    /// Served from an expired entry; a refresh is (or already was) running
    Stale,
    /// Fetched while the caller waited
    Fetched,
}

/// A value returned by [`CacheManager::read`] with how it was obtained.
#[derive(Debug)]
pub struct CacheRead<T> {
    /// The value
    pub value: Arc<T>,
    /// Where it came from
    pub freshness: Freshness,
}

pub(crate) struct CacheState {
    pub(crate) store: EntryStore<AnyValue>,
    pub(crate) revalidating: RevalidationTracker,
}

pub(crate) struct Shared {
    pub(crate) resolver: PolicyResolver,
    pub(crate) state: Mutex<CacheState>,
    pub(crate) stats: StatsRecorder,
    runtime: Handle,
}

impl Shared {
    /// Deletes expired entries that are not being revalidated.
    #[instrument(skip(self))]
    pub(crate) fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let revalidating = &state.revalidating;
        let resolver = &self.resolver;
        let removed = state.store.delete_where(|key, entry| {
            resolver.resolve(key).is_expired(entry.age(now)) && !revalidating.contains(key)
        });
        drop(guard);

        self.stats.swept(removed.len());
        removed.len()
    }
}

/// Releases a key's revalidation slot when dropped, whether the refresh
/// succeeded, failed or panicked.
struct RevalidationGuard {
    shared: Arc<Shared>,
    key: CacheKey,
}

impl Drop for RevalidationGuard {
    fn drop(&mut self) {
        self.shared.state.lock().revalidating.end(&self.key);
    }
}

enum Lookup<T> {
    Fresh(Arc<T>),
    Stale { value: Arc<T>, start_refresh: bool },
    Fetch,
}

/// Response cache with per-prefix TTLs and stale-while-revalidate.
///
/// A `CacheManager` is a handle: clones share the same entries. Build one
/// per process and pass it to every data-access component. The expiry
/// sweep starts on construction and stops on [`shutdown`](Self::shutdown)
/// or when the last handle is dropped.
///
/// Values of any `Send + Sync + 'static` type can be stored; they are kept
/// behind an `Arc` and never cloned.
#[derive(Clone)]
pub struct CacheManager {
    shared: Arc<Shared>,
    sweeper: Arc<SweepTask>,
}

impl CacheManager {
    /// Creates a cache and starts its sweep task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| CacheError::NoRuntime(e.to_string()))?;

        let shared = Arc::new(Shared {
            resolver: PolicyResolver::from_config(&config),
            state: Mutex::new(CacheState {
                store: EntryStore::new(),
                revalidating: RevalidationTracker::new(),
            }),
            stats: StatsRecorder::default(),
            runtime: runtime.clone(),
        });
        let sweeper = SweepTask::start(&runtime, Arc::downgrade(&shared), config.sweep_interval);

        Ok(Self {
            shared,
            sweeper: Arc::new(sweeper),
        })
    }

    /// Returns the value for `key`, calling `fetch` when the cache cannot
    /// answer on its own.
    ///
    /// Errors from `fetch` are returned as-is. See [`read`](Self::read) to
    /// also learn whether the value was stale.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &str, fetch: F) -> std::result::Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        E: Display + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        self.read(key, fetch).await.map(|read| read.value)
    }

    /// Like [`get_or_fetch`](Self::get_or_fetch), reporting how the value
    /// was obtained.
    #[instrument(skip(self, fetch))]
    pub async fn read<T, E, F, Fut>(&self, key: &str, fetch: F) -> std::result::Result<CacheRead<T>, E>
    where
        T: Send + Sync + 'static,
        E: Display + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        let policy = self.shared.resolver.resolve(key);

        match self.lookup::<T>(key, policy) {
            Lookup::Fresh(value) => {
                self.shared.stats.hit();
                debug!("fresh hit");
                Ok(CacheRead {
                    value,
                    freshness: Freshness::Fresh,
                })
            }
            Lookup::Stale {
                value,
                start_refresh,
            } => {
                self.shared.stats.stale_hit();
                if start_refresh {
                    debug!("stale hit, revalidating in background");
                    self.spawn_revalidation(key, fetch());
                } else {
                    debug!("stale hit, revalidation already in flight");
                }
                Ok(CacheRead {
                    value,
                    freshness: Freshness::Stale,
                })
            }
            Lookup::Fetch => {
                self.shared.stats.miss();
                debug!("miss, fetching");
                match fetch().await {
                    Ok(value) => {
                        let value = Arc::new(value);
                        let stored: AnyValue = value.clone();
                        self.shared.state.lock().store.put(key, stored, Instant::now());
                        Ok(CacheRead {
                            value,
                            freshness: Freshness::Fetched,
                        })
                    }
                    Err(err) => {
                        self.shared.stats.fetch_failed();
                        debug!(error = %err, "fetch failed");
                        Err(err)
                    }
                }
            }
        }
    }

    fn lookup<T: Send + Sync + 'static>(&self, key: &str, policy: CachePolicy) -> Lookup<T> {
        let now = Instant::now();
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;

        let Some(entry) = state.store.get(key) else {
            return Lookup::Fetch;
        };
        let age = entry.age(now);
        let value = match Arc::clone(&entry.value).downcast::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, "cached value has a different type than requested; refetching");
                return Lookup::Fetch;
            }
        };

        if !policy.is_expired(age) {
            Lookup::Fresh(value)
        } else if policy.stale_while_revalidate {
            Lookup::Stale {
                value,
                start_refresh: state.revalidating.try_begin(key),
            }
        } else {
            Lookup::Fetch
        }
    }

    fn spawn_revalidation<T, E, Fut>(&self, key: &str, refresh: Fut)
    where
        T: Send + Sync + 'static,
        E: Display + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        self.shared.stats.revalidation_started();

        let guard = RevalidationGuard {
            shared: Arc::clone(&self.shared),
            key: key.to_owned(),
        };
        let span = debug_span!("revalidate", key = %key);

        self.shared.runtime.spawn(
            async move {
                let shared = Arc::clone(&guard.shared);
                match refresh.await {
                    Ok(value) => {
                        let stored: AnyValue = Arc::new(value);
                        shared.state.lock().store.put(guard.key.clone(), stored, Instant::now());
                        debug!("revalidated");
                    }
                    Err(err) => {
                        shared.stats.revalidation_failed();
                        warn!(error = %err, "background revalidation failed; keeping stale value");
                    }
                }
                drop(guard);
            }
            .instrument(span),
        );
    }

    /// Removes `key` and forgets any refresh in flight for it.
    pub fn invalidate(&self, key: &str) {
        let mut state = self.shared.state.lock();
        state.store.delete(key);
        state.revalidating.end(key);
    }

    /// Removes every key starting with `prefix`. Returns how many entries
    /// were removed.
    ///
    /// Mutations call this to drop list and detail caches together, e.g.
    /// `invalidate_pattern("event")` after creating an event clears both
    /// `events:*` and `event:*`.
    pub fn invalidate_pattern(&self, prefix: &str) -> usize {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;

        let removed = state.store.delete_where(|key, _| key.starts_with(prefix));
        for key in &removed {
            state.revalidating.end(key);
        }
        debug!(prefix, removed = removed.len(), "pattern invalidated");
        removed.len()
    }

    /// Drops every entry and all revalidation bookkeeping.
    pub fn clear(&self) {
        let mut state = self.shared.state.lock();
        state.store.clear();
        state.revalidating.clear();
    }

    /// Runs one expiry sweep now. Returns how many entries were removed.
    ///
    /// The sweep task calls this on every tick.
    pub fn purge_expired(&self) -> usize {
        self.shared.purge_expired()
    }

    /// Stops the sweep task. Reads and invalidation keep working.
    pub fn shutdown(&self) {
        self.sweeper.stop();
    }

    /// The background sweep owned by this cache.
    pub fn sweep_task(&self) -> &SweepTask {
        &self.sweeper
    }

    /// Returns the policy `key` resolves to.
    pub fn policy_for(&self, key: &str) -> CachePolicy {
        self.shared.resolver.resolve(key)
    }

    /// Returns true if `key` has a stored entry, fresh or not.
    pub fn contains(&self, key: &str) -> bool {
        self.shared.state.lock().store.contains(key)
    }

    /// Returns true if a background refresh for `key` is in flight.
    pub fn is_revalidating(&self, key: &str) -> bool {
        self.shared.state.lock().revalidating.contains(key)
    }

    /// Snapshot of stored keys.
    pub fn keys(&self) -> Vec<CacheKey> {
        self.shared.state.lock().store.keys()
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.shared.state.lock().store.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().store.is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let (entries, revalidating) = {
            let state = self.shared.state.lock();
            (state.store.len(), state.revalidating.len())
        };
        self.shared.stats.snapshot(entries, revalidating)
    }
}
