//! Redis-backed account cache.
//!
//! Accounts are stored as JSON under `account-<id>` with `SET .. EX`, so the
//! server evicts them once the time-to-live elapses.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::redis;
use tracing::warn;

use crate::domain::ports::{AccountCache, AccountCacheError, account_cache_key};
use crate::domain::{Account, AccountId};
use crate::outbound::redis_pool::RedisPool;

/// [`AccountCache`] over a shared Redis instance.
#[derive(Clone)]
pub struct RedisAccountCache {
    pool: RedisPool,
    ttl_secs: u64,
}

impl RedisAccountCache {
    /// Create a cache writing entries with the given time-to-live.
    ///
    /// Sub-second TTLs round up to one second, the smallest `EX` Redis
    /// accepts.
    pub fn new(pool: RedisPool, ttl: Duration) -> Self {
        Self {
            pool,
            ttl_secs: ttl_secs(ttl),
        }
    }
}

fn ttl_secs(ttl: Duration) -> u64 {
    let whole = ttl.as_secs();
    let rounded = if ttl.subsec_nanos() > 0 {
        whole.saturating_add(1)
    } else {
        whole
    };
    rounded.max(1)
}

fn backend_error(error: impl std::fmt::Display) -> AccountCacheError {
    AccountCacheError::backend(error.to_string())
}

/// Decode a cached payload, discarding it when it belongs to another id.
fn decode(id: AccountId, payload: &str) -> Result<Option<Account>, AccountCacheError> {
    let account: Account = serde_json::from_str(payload)
        .map_err(|err| AccountCacheError::serialization(err.to_string()))?;
    if account.id != id {
        warn!(requested = %id, cached = %account.id, "cached account id mismatch; ignoring entry");
        return Ok(None);
    }
    Ok(Some(account))
}

#[async_trait]
impl AccountCache for RedisAccountCache {
    async fn get(&self, id: AccountId) -> Result<Option<Account>, AccountCacheError> {
        let mut conn = self.pool.get().await.map_err(backend_error)?;
        let payload: Option<String> = redis::cmd("GET")
            .arg(account_cache_key(id))
            .query_async(&mut *conn)
            .await
            .map_err(backend_error)?;
        payload.map_or(Ok(None), |raw| decode(id, &raw))
    }

    async fn set(&self, account: &Account) -> Result<(), AccountCacheError> {
        let payload = serde_json::to_string(account)
            .map_err(|err| AccountCacheError::serialization(err.to_string()))?;
        let mut conn = self.pool.get().await.map_err(backend_error)?;
        let (): () = redis::cmd("SET")
            .arg(account_cache_key(account.id))
            .arg(payload)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async(&mut *conn)
            .await
            .map_err(backend_error)?;
        Ok(())
    }
}
