//! Per-identity caching of authorization snapshots.

use dashmap::DashMap;
use moka::future::Cache;
use parking_lot::RwLock;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::fetcher::{AuthorizationFetcher, FetchFn};
use super::stats::{CacheStats, StatsCounters};
use super::AuthorizationCacheConfig;
use crate::authz::UserId;
use crate::error::{GrantlineError, Result};

/// Invalidation state a load started under.
///
/// `epoch` moves on every whole-cache invalidation, `user` on every
/// invalidation of one user. An entry is stale for a caller if either
/// counter has moved since the entry's load began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Generation {
    epoch: u64,
    user: u64,
}

impl Generation {
    fn is_older_than(&self, observed: &Generation) -> bool {
        self.epoch < observed.epoch || self.user < observed.user
    }
}

struct Entry<T> {
    value: Arc<T>,
    generation: Generation,
}

/// The bounded store together with the bounds it was built from.
struct ActiveCache<T> {
    store: Cache<UserId, Arc<Entry<T>>>,
    config: AuthorizationCacheConfig,
}

impl<T: Send + Sync + 'static> ActiveCache<T> {
    fn build(config: AuthorizationCacheConfig) -> Self {
        let store = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();
        Self { store, config }
    }
}

/// Caches one snapshot `T` per user and keeps it in step with session and
/// configuration lifecycle events.
///
/// Concurrent lookups of a missing user share a single fetch. Lookups that
/// begin after an invalidation completes never see a value loaded before it.
/// Failed fetches are passed to every waiting caller and leave no entry.
///
/// Besides the bounded store, the service keeps one `u64` invalidation
/// counter per distinct user ever invalidated. That map is not bounded by
/// `max_entries`; it grows with the population of known identities, not with
/// the number of invalidations.
pub struct CachingAuthorizationService<T> {
    fetcher: Arc<dyn AuthorizationFetcher<T>>,
    active: RwLock<ActiveCache<T>>,
    epoch: AtomicU64,
    /// Per-user invalidation counters. Never pruned: an entry removed here
    /// would let a stale in-flight load pass as fresh.
    generations: DashMap<UserId, u64>,
    stats: StatsCounters,
}

impl<T: Send + Sync + 'static> CachingAuthorizationService<T> {
    /// Create a service with a validated configuration.
    pub fn new<F>(fetcher: F, config: AuthorizationCacheConfig) -> Result<Self>
    where
        F: AuthorizationFetcher<T> + 'static,
    {
        Self::with_shared_fetcher(Arc::new(fetcher), config)
    }

    /// Create a service around an already shared fetcher.
    pub fn with_shared_fetcher(
        fetcher: Arc<dyn AuthorizationFetcher<T>>,
        config: AuthorizationCacheConfig,
    ) -> Result<Self> {
        config.validate()?;
        info!(
            max_entries = config.max_entries,
            ttl_secs = config.ttl.as_secs(),
            "Authorization cache created"
        );

        Ok(Self {
            fetcher,
            active: RwLock::new(ActiveCache::build(config)),
            epoch: AtomicU64::new(0),
            generations: DashMap::new(),
            stats: StatsCounters::default(),
        })
    }

    /// Create a service whose fetch strategy is an async closure.
    pub fn from_fn<F, Fut>(fetch: F, config: AuthorizationCacheConfig) -> Result<Self>
    where
        F: Fn(UserId) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self::new(FetchFn::new(fetch), config)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lookup
    // ─────────────────────────────────────────────────────────────────────────

    /// The user's snapshot, loading it on a miss.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get(&self, user_id: &UserId) -> Result<Arc<T>> {
        let observed = self.generation(user_id);

        loop {
            let store = self.store();

            if let Some(entry) = store.get(user_id).await {
                if !entry.generation.is_older_than(&observed) {
                    self.stats.record_hit();
                    debug!("Authorization cache hit");
                    return Ok(entry.value.clone());
                }
                store.invalidate(user_id).await;
            }

            self.stats.record_miss();
            debug!("Authorization cache miss");

            let entry = store
                .try_get_with(user_id.clone(), self.load(user_id))
                .await
                .map_err(GrantlineError::from)?;

            if !entry.generation.is_older_than(&observed) {
                return Ok(entry.value.clone());
            }

            // Joined a load that began before this lookup's invalidation.
            debug!("Discarding authorization snapshot loaded before invalidation");
            store.invalidate(user_id).await;
        }
    }

    /// Whether a snapshot for the user is currently held.
    pub fn contains(&self, user_id: &UserId) -> bool {
        self.store().contains_key(user_id)
    }

    async fn load(&self, user_id: &UserId) -> Result<Arc<Entry<T>>> {
        let generation = self.generation(user_id);

        match self.fetcher.fetch(user_id).await {
            Ok(value) => {
                self.stats.record_load();
                debug!(user_id = %user_id, "Loaded authorization snapshot");
                Ok(Arc::new(Entry {
                    value: Arc::new(value),
                    generation,
                }))
            }
            Err(error) => {
                self.stats.record_load_failure(&error.code().to_string());
                warn!(
                    user_id = %user_id,
                    code = %error.code(),
                    error = %error,
                    "Failed to load authorization snapshot"
                );
                Err(error)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Invalidate and eagerly reload the user's snapshot.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn on_identity_session_start(&self, user_id: &UserId) -> Result<()> {
        self.invalidate_for(user_id, "session_start").await;
        self.get(user_id).await.map(|_| ())
    }

    /// Invalidate and eagerly reload the user's snapshot.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn on_identity_session_refresh(&self, user_id: &UserId) -> Result<()> {
        self.invalidate_for(user_id, "session_refresh").await;
        self.get(user_id).await.map(|_| ())
    }

    /// Invalidate the user's snapshot; the next lookup reloads it.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn on_identity_session_end(&self, user_id: &UserId) {
        self.invalidate_for(user_id, "session_end").await;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────────────────────────────────────

    /// Rebuild the cache with new bounds, dropping every entry.
    ///
    /// Invalid bounds are rejected and the active cache is kept as is.
    #[instrument(skip(self), fields(max_entries = config.max_entries, ttl_secs = config.ttl.as_secs()))]
    pub async fn on_configuration_reload(&self, config: AuthorizationCacheConfig) -> Result<()> {
        if let Err(error) = config.validate() {
            warn!(error = %error, "Rejected authorization cache configuration; keeping current cache");
            return Err(error);
        }

        let rebuilt = ActiveCache::build(config);
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let previous = std::mem::replace(&mut *self.active.write(), rebuilt);

        previous.store.run_pending_tasks().await;
        let dropped = previous.store.entry_count();
        previous.store.invalidate_all();
        self.stats.record_invalidations("configuration_reload", dropped);

        info!(
            previous_max_entries = previous.config.max_entries,
            previous_ttl_secs = previous.config.ttl.as_secs(),
            dropped,
            "Authorization cache reconfigured"
        );
        Ok(())
    }

    /// Bounds of the active cache.
    pub fn config(&self) -> AuthorizationCacheConfig {
        self.active.read().config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Invalidation & stats
    // ─────────────────────────────────────────────────────────────────────────

    /// Drop the user's snapshot.
    pub async fn invalidate(&self, user_id: &UserId) {
        self.invalidate_for(user_id, "explicit").await;
    }

    /// Drop every snapshot.
    pub async fn invalidate_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let store = self.store();
        store.run_pending_tasks().await;
        let dropped = store.entry_count();
        store.invalidate_all();
        self.stats.record_invalidations("invalidate_all", dropped);
        info!(dropped, "Invalidated all authorization snapshots");
    }

    pub async fn stats(&self) -> CacheStats {
        let store = self.store();
        store.run_pending_tasks().await;
        self.stats.snapshot(store.entry_count())
    }

    async fn invalidate_for(&self, user_id: &UserId, reason: &'static str) {
        *self.generations.entry(user_id.clone()).or_insert(0) += 1;
        self.store().invalidate(user_id).await;
        self.stats.record_invalidations(reason, 1);
        debug!(user_id = %user_id, reason, "Invalidated authorization snapshot");
    }

    fn generation(&self, user_id: &UserId) -> Generation {
        Generation {
            epoch: self.epoch.load(Ordering::SeqCst),
            user: self.generations.get(user_id).map(|g| *g).unwrap_or(0),
        }
    }

    /// Clone of the active store handle; the lock is released on return.
    fn store(&self) -> Cache<UserId, Arc<Entry<T>>> {
        self.active.read().store.clone()
    }
}
