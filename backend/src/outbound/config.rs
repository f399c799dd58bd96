//! Adapter selection from configuration.
//!
//! [`AdapterConfig`] gathers the cache and limiter switches together with an
//! optional Redis pool and builds the matching adapters:
//!
//! | cache enabled | Redis pool | account cache        |
//! |---------------|------------|----------------------|
//! | no            | any        | [`DisabledAccountCache`] |
//! | yes           | present    | [`RedisAccountCache`]    |
//! | yes           | absent     | [`InMemoryAccountCache`] |
//!
//! The limiter is Redis-backed when a pool is present and in process
//! otherwise. The admission switch travels with [`RateLimiterConfig`] into
//! [`Admission`].

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{
    AccountCache, AccountCacheError, ClientKey, LimitDecision, RequestLimiter,
    RequestLimiterError,
};
use crate::domain::{Account, AccountId, Admission, FixedWindowLimiter, RateLimiterConfig};
use crate::outbound::cache::{
    CacheConfig, DisabledAccountCache, InMemoryAccountCache, RedisAccountCache,
};
use crate::outbound::rate_limit::RedisRateLimiter;
use crate::outbound::redis_pool::{RedisPool, RedisPoolError};
use crate::settings::CoreSettings;

/// Account cache chosen by [`AdapterConfig::account_cache`].
#[derive(Clone)]
pub enum ConfiguredAccountCache {
    /// Caching switched off.
    Disabled(DisabledAccountCache),
    /// Process-local entries.
    InProcess(InMemoryAccountCache),
    /// Entries shared through Redis.
    Shared(RedisAccountCache),
}

#[async_trait]
impl AccountCache for ConfiguredAccountCache {
    async fn get(&self, id: AccountId) -> Result<Option<Account>, AccountCacheError> {
        match self {
            Self::Disabled(cache) => cache.get(id).await,
            Self::InProcess(cache) => cache.get(id).await,
            Self::Shared(cache) => cache.get(id).await,
        }
    }

    async fn set(&self, account: &Account) -> Result<(), AccountCacheError> {
        match self {
            Self::Disabled(cache) => cache.set(account).await,
            Self::InProcess(cache) => cache.set(account).await,
            Self::Shared(cache) => cache.set(account).await,
        }
    }
}

/// Request limiter chosen by [`AdapterConfig::request_limiter`].
pub enum ConfiguredLimiter {
    /// Windows tracked in this process.
    InProcess(FixedWindowLimiter),
    /// Counters shared through Redis.
    Shared(RedisRateLimiter),
}

#[async_trait]
impl RequestLimiter for ConfiguredLimiter {
    async fn allow(&self, key: &ClientKey) -> Result<LimitDecision, RequestLimiterError> {
        match self {
            Self::InProcess(limiter) => limiter.allow(key).await,
            Self::Shared(limiter) => limiter.allow(key).await,
        }
    }
}

/// Configuration consumed when wiring the cache and admission adapters.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use mockable::DefaultClock;
/// use social_backend::outbound::cache::CacheConfig;
/// use social_backend::outbound::config::{AdapterConfig, ConfiguredAccountCache};
///
/// let config = AdapterConfig::new(Arc::new(DefaultClock))
///     .with_cache(CacheConfig::default().with_enabled(false));
/// assert!(matches!(config.account_cache(), ConfiguredAccountCache::Disabled(_)));
/// ```
#[derive(Clone)]
pub struct AdapterConfig {
    cache: CacheConfig,
    rate_limiter: RateLimiterConfig,
    redis_pool: Option<RedisPool>,
    clock: Arc<dyn Clock>,
}

impl AdapterConfig {
    /// Defaults for both switches, no Redis pool.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: CacheConfig::default(),
            rate_limiter: RateLimiterConfig::default(),
            redis_pool: None,
            clock,
        }
    }

    /// Build from loaded settings, opening the Redis pool when a URL is set.
    ///
    /// # Errors
    ///
    /// Returns [`RedisPoolError::Build`] when the Redis URL cannot be used.
    pub async fn from_settings(
        settings: &CoreSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RedisPoolError> {
        let config = Self::new(clock)
            .with_cache(settings.cache_config())
            .with_rate_limiter(settings.rate_limiter_config());
        match settings.redis_pool_config() {
            Some(pool_config) => Ok(config.with_redis_pool(RedisPool::new(pool_config).await?)),
            None => Ok(config),
        }
    }

    /// Set the cache configuration.
    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Set the admission configuration.
    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiterConfig) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// Share the cache and limiter through `pool`.
    #[must_use]
    pub fn with_redis_pool(mut self, pool: RedisPool) -> Self {
        self.redis_pool = Some(pool);
        self
    }

    /// Cache configuration in effect.
    pub const fn cache(&self) -> CacheConfig {
        self.cache
    }

    /// Admission configuration in effect.
    pub const fn rate_limiter(&self) -> RateLimiterConfig {
        self.rate_limiter
    }

    /// Build the account cache selected by the cache switch and pool.
    pub fn account_cache(&self) -> ConfiguredAccountCache {
        select_cache(
            &self.cache,
            self.redis_pool.as_ref(),
            |pool, ttl| ConfiguredAccountCache::Shared(RedisAccountCache::new(pool.clone(), ttl)),
            || {
                ConfiguredAccountCache::InProcess(InMemoryAccountCache::new(
                    self.cache.ttl(),
                    Arc::clone(&self.clock),
                ))
            },
        )
    }

    /// Build the limiter selected by the pool.
    pub fn request_limiter(&self) -> ConfiguredLimiter {
        match &self.redis_pool {
            Some(pool) => {
                ConfiguredLimiter::Shared(RedisRateLimiter::new(pool.clone(), self.rate_limiter))
            }
            None => ConfiguredLimiter::InProcess(FixedWindowLimiter::new(
                self.rate_limiter,
                Arc::clone(&self.clock),
            )),
        }
    }

    /// Admission gate over [`Self::request_limiter`], honouring the
    /// admission switch.
    pub fn admission(&self) -> Admission<ConfiguredLimiter> {
        Admission::new(Arc::new(self.request_limiter()), &self.rate_limiter)
    }
}

fn select_cache<Pool, Cache>(
    config: &CacheConfig,
    pool: Option<&Pool>,
    shared: impl FnOnce(&Pool, std::time::Duration) -> Cache,
    in_process: impl FnOnce() -> Cache,
) -> Cache
where
    Cache: From<DisabledAccountCache>,
{
    if !config.enabled() {
        return Cache::from(DisabledAccountCache);
    }
    match pool {
        Some(pool) => shared(pool, config.ttl()),
        None => in_process(),
    }
}

impl From<DisabledAccountCache> for ConfiguredAccountCache {
    fn from(cache: DisabledAccountCache) -> Self {
        Self::Disabled(cache)
    }
}
