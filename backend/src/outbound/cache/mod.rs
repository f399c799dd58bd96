//! Account cache adapters.
//!
//! Entries live for a fixed time-to-live and are keyed by
//! [`account_cache_key`](crate::domain::ports::account_cache_key). Three
//! implementations of [`AccountCache`](crate::domain::ports::AccountCache)
//! are provided:
//!
//! - [`RedisAccountCache`] shares entries across processes through Redis.
//! - [`InMemoryAccountCache`] keeps entries in process, expiring them against
//!   an injected clock.
//! - [`DisabledAccountCache`] always misses, for deployments that run
//!   without a cache.

mod memory;
mod redis;

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::ports::{AccountCache, AccountCacheError};
use crate::domain::{Account, AccountId};

pub use self::memory::InMemoryAccountCache;
pub use self::redis::RedisAccountCache;

/// Default lifetime of a cached account.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Account cache switch and entry lifetime.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use social_backend::outbound::cache::CacheConfig;
///
/// let config = CacheConfig::default().with_ttl(Duration::from_secs(30));
/// assert!(config.enabled());
/// assert_eq!(config.ttl(), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    enabled: bool,
    ttl: Duration,
}

impl CacheConfig {
    /// Toggle the cache. A disabled cache is served by [`DisabledAccountCache`].
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the entry lifetime.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Whether caching is active.
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Entry lifetime.
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: DEFAULT_CACHE_TTL,
        }
    }
}

/// Cache that never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAccountCache;

#[async_trait]
impl AccountCache for DisabledAccountCache {
    async fn get(&self, _id: AccountId) -> Result<Option<Account>, AccountCacheError> {
        Ok(None)
    }

    async fn set(&self, _account: &Account) -> Result<(), AccountCacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::cache::memory::tests::account;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn disabled_cache_always_misses() {
        let cache = DisabledAccountCache;
        cache.set(&account(7)).await.expect("set succeeds");
        let result = cache.get(AccountId::new(7)).await.expect("get succeeds");
        assert!(result.is_none());
    }
}
