//! Fixed-window request admission.
//!
//! Each client key owns a counter and the instant its window opened. A window
//! ends `window` after it opened; the first request after that starts a fresh
//! window with a zeroed counter. A request is admitted while the counter is
//! below the limit, and only admitted requests are counted.
//!
//! Fixed windows are bursty at boundaries: a client can land `limit` requests
//! at the end of one window and `limit` more at the start of the next.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use parking_lot::Mutex;
use tracing::warn;

use super::Error;
use super::ports::{ClientKey, LimitDecision, RequestLimiter, RequestLimiterError};

/// Limiter settings.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use social_backend::domain::RateLimiterConfig;
///
/// let config = RateLimiterConfig::default();
/// assert_eq!(config.limit(), 20);
/// assert_eq!(config.window(), Duration::from_secs(5));
/// assert!(config.enabled());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterConfig {
    limit: u32,
    window: Duration,
    enabled: bool,
}

impl RateLimiterConfig {
    const DEFAULT_LIMIT: u32 = 20;
    const DEFAULT_WINDOW_SECS: u64 = 5;

    /// Create an enabled configuration.
    pub const fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            enabled: true,
        }
    }

    /// Toggle admission control. A disabled limiter admits everything.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Requests admitted per window.
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Window length.
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Whether admission control is active.
    pub const fn enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_LIMIT,
            Duration::from_secs(Self::DEFAULT_WINDOW_SECS),
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    opened_at: DateTime<Utc>,
    count: u32,
}

impl Window {
    fn closes_at(&self, length: TimeDelta) -> Option<DateTime<Utc>> {
        self.opened_at.checked_add_signed(length)
    }

    fn expired(&self, length: TimeDelta, now: DateTime<Utc>) -> bool {
        self.closes_at(length).is_some_and(|end| now > end)
    }
}

/// In-process fixed-window limiter.
///
/// State is per process; run [`crate::outbound::rate_limit::RedisRateLimiter`]
/// instead when several instances must share one budget.
pub struct FixedWindowLimiter {
    limit: u32,
    window: TimeDelta,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<ClientKey, Window>>,
}

impl FixedWindowLimiter {
    /// Tracked clients above which `allow` sweeps out expired windows.
    const PRUNE_THRESHOLD: usize = 4096;

    /// Create a limiter from `config`. The `enabled` switch is honoured by
    /// [`Admission`], not here.
    pub fn new(config: RateLimiterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            limit: config.limit(),
            window: TimeDelta::from_std(config.window()).unwrap_or(TimeDelta::MAX),
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Check-and-increment under one lock acquisition.
    pub fn check(&self, key: &ClientKey) -> LimitDecision {
        let now = self.clock.utc();
        let mut windows = self.windows.lock();
        if windows.len() >= Self::PRUNE_THRESHOLD {
            let length = self.window;
            windows.retain(|_, window| !window.expired(length, now));
        }

        let window = windows.entry(key.clone()).or_insert(Window {
            opened_at: now,
            count: 0,
        });
        if window.expired(self.window, now) {
            *window = Window {
                opened_at: now,
                count: 0,
            };
        }

        if window.count < self.limit {
            window.count += 1;
            LimitDecision::Admitted
        } else {
            let retry_after = window
                .closes_at(self.window)
                .and_then(|end| (end - now).to_std().ok())
                .unwrap_or(Duration::ZERO);
            LimitDecision::Rejected { retry_after }
        }
    }

    /// Drop windows that have closed. Returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        let now = self.clock.utc();
        let length = self.window;
        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|_, window| !window.expired(length, now));
        before - windows.len()
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().len()
    }
}

#[async_trait]
impl RequestLimiter for FixedWindowLimiter {
    async fn allow(&self, key: &ClientKey) -> Result<LimitDecision, RequestLimiterError> {
        Ok(self.check(key))
    }
}

/// Request admission gate placed in front of every core operation.
#[derive(Clone)]
pub struct Admission<L> {
    limiter: Arc<L>,
    enabled: bool,
}

impl<L> Admission<L> {
    /// Wrap a limiter. When `config` is disabled every request is admitted
    /// without consulting it.
    pub fn new(limiter: Arc<L>, config: &RateLimiterConfig) -> Self {
        Self {
            limiter,
            enabled: config.enabled(),
        }
    }
}

impl<L> Admission<L>
where
    L: RequestLimiter,
{
    /// Admit or reject one request from `key`.
    ///
    /// Rejections carry `retryAfterSecs` in the error details. A failing
    /// limiter backend admits the request.
    pub async fn check(&self, key: &ClientKey) -> Result<(), Error> {
        if !self.enabled {
            return Ok(());
        }
        match self.limiter.allow(key).await {
            Ok(LimitDecision::Admitted) => Ok(()),
            Ok(LimitDecision::Rejected { retry_after }) => {
                Err(Error::rate_limited(retry_after_secs(retry_after)))
            }
            Err(error) => {
                warn!(client = %key, %error, "rate limiter unavailable; admitting request");
                Ok(())
            }
        }
    }
}

fn retry_after_secs(retry_after: Duration) -> u64 {
    let whole = retry_after.as_secs();
    let rounded = if retry_after.subsec_nanos() > 0 {
        whole.saturating_add(1)
    } else {
        whole
    };
    rounded.max(1)
}

#[cfg(test)]
#[path = "rate_limit_tests.rs"]
mod tests;
