//! Fixed-window rate limiting shared across processes through Redis.
//!
//! Each client owns one counter key, `ratelimit:<client>`. A request runs a
//! `MULTI` block of `SET key 0 NX PX <window>`, `INCR key` and `PTTL key`:
//! the first request in a window creates the counter with the window as its
//! expiry, every request increments it, and the remaining lifetime becomes
//! the retry hint. A request is admitted while the incremented count is
//! within the limit, which matches admitting while the pre-increment count
//! is below it.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::redis;

use crate::domain::RateLimiterConfig;
use crate::domain::ports::{ClientKey, LimitDecision, RequestLimiter, RequestLimiterError};
use crate::outbound::redis_pool::RedisPool;

/// Namespace prefixed to every counter key.
pub const KEY_PREFIX: &str = "ratelimit:";

/// [`RequestLimiter`] whose counters live in Redis.
#[derive(Clone)]
pub struct RedisRateLimiter {
    pool: RedisPool,
    limit: u64,
    window: Duration,
}

impl RedisRateLimiter {
    /// Create a limiter enforcing `config` against the pooled Redis.
    pub fn new(pool: RedisPool, config: RateLimiterConfig) -> Self {
        Self {
            pool,
            limit: u64::from(config.limit()),
            window: config.window(),
        }
    }
}

fn counter_key(key: &ClientKey) -> String {
    format!("{KEY_PREFIX}{}", key.as_str())
}

fn window_millis(window: Duration) -> u64 {
    u64::try_from(window.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Turn the post-increment count and the key's remaining lifetime into a
/// decision.
///
/// A negative `pttl` means the key has no expiry or has just vanished; the
/// full window is then reported as the retry hint.
fn decide(count: u64, pttl_ms: i64, limit: u64, window: Duration) -> LimitDecision {
    if count <= limit {
        return LimitDecision::Admitted;
    }
    let retry_after = u64::try_from(pttl_ms)
        .ok()
        .filter(|ms| *ms > 0)
        .map_or(window, Duration::from_millis);
    LimitDecision::Rejected { retry_after }
}

fn backend_error(error: impl std::fmt::Display) -> RequestLimiterError {
    RequestLimiterError::backend(error.to_string())
}

#[async_trait]
impl RequestLimiter for RedisRateLimiter {
    async fn allow(&self, key: &ClientKey) -> Result<LimitDecision, RequestLimiterError> {
        let counter = counter_key(key);
        let mut conn = self.pool.get().await.map_err(backend_error)?;
        let (count, pttl_ms): (u64, i64) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&counter)
            .arg(0)
            .arg("NX")
            .arg("PX")
            .arg(window_millis(self.window))
            .ignore()
            .cmd("INCR")
            .arg(&counter)
            .cmd("PTTL")
            .arg(&counter)
            .query_async(&mut *conn)
            .await
            .map_err(backend_error)?;
        Ok(decide(count, pttl_ms, self.limit, self.window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const WINDOW: Duration = Duration::from_secs(5);

    #[rstest]
    #[case(1)]
    #[case(20)]
    fn counts_within_limit_are_admitted(#[case] count: u64) {
        assert_eq!(decide(count, 4_000, 20, WINDOW), LimitDecision::Admitted);
    }

    #[rstest]
    fn count_past_limit_reports_remaining_window() {
        assert_eq!(
            decide(21, 1_500, 20, WINDOW),
            LimitDecision::Rejected {
                retry_after: Duration::from_millis(1_500)
            }
        );
    }

    #[rstest]
    #[case(-1)]
    #[case(-2)]
    #[case(0)]
    fn missing_expiry_falls_back_to_window(#[case] pttl: i64) {
        assert_eq!(
            decide(21, pttl, 20, WINDOW),
            LimitDecision::Rejected { retry_after: WINDOW }
        );
    }

    #[rstest]
    fn keys_are_namespaced() {
        let key = ClientKey::new("203.0.113.7").expect("valid key");
        assert_eq!(counter_key(&key), "ratelimit:203.0.113.7");
    }

    #[rstest]
    #[case(Duration::from_secs(5), 5_000)]
    #[case(Duration::ZERO, 1)]
    fn window_is_expressed_in_millis(#[case] window: Duration, #[case] expected: u64) {
        assert_eq!(window_millis(window), expected);
    }
}
