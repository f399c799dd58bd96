//! Core settings loaded via OrthoConfig.
//!
//! Values come from `SOCIAL_*` environment variables, configuration files and
//! command-line flags, in OrthoConfig's usual precedence. Every field is
//! optional; accessors fill in the documented defaults and build the typed
//! configuration each component takes.

use std::time::Duration;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{OnboardingConfig, PasswordHashCost, RateLimiterConfig};
use crate::outbound::cache::CacheConfig;
use crate::outbound::persistence::PoolConfig;
use crate::outbound::redis_pool::RedisPoolConfig;

/// Settings for the persistence, caching, admission and onboarding layers.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SOCIAL")]
pub struct CoreSettings {
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub db_pool_size: Option<u32>,
    /// Deadline for one store call, in milliseconds.
    pub query_timeout_ms: Option<u64>,
    /// Redis URL for the shared cache and limiter. Unset keeps both in
    /// process.
    pub redis_url: Option<String>,
    /// Enable the account cache.
    #[ortho_config(default = true)]
    pub cache_enabled: bool,
    /// Account cache entry lifetime in seconds.
    pub cache_ttl_secs: Option<u64>,
    /// Enable request admission control.
    #[ortho_config(default = true)]
    pub rate_limit_enabled: bool,
    /// Requests admitted per client per window.
    pub rate_limit_requests: Option<u32>,
    /// Rate-limit window length in milliseconds.
    pub rate_limit_window_ms: Option<u64>,
    /// Invitation lifetime in hours.
    pub invitation_ttl_hours: Option<u32>,
    /// Argon2 memory cost in KiB.
    pub password_memory_kib: Option<u32>,
    /// Argon2 iteration count.
    pub password_iterations: Option<u32>,
    /// Argon2 lane count.
    pub password_parallelism: Option<u32>,
}

impl CoreSettings {
    /// Database pool configuration, or `None` when no URL is configured.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        let url = self.database_url.as_deref()?;
        let mut config = PoolConfig::new(url);
        if let Some(size) = self.db_pool_size {
            config = config.with_max_size(size);
        }
        if let Some(ms) = self.query_timeout_ms {
            config = config.with_query_timeout(Duration::from_millis(ms));
        }
        Some(config)
    }

    /// Redis pool configuration, or `None` when no URL is configured.
    pub fn redis_pool_config(&self) -> Option<RedisPoolConfig> {
        self.redis_url.as_deref().map(RedisPoolConfig::new)
    }

    /// Account cache configuration.
    pub fn cache_config(&self) -> CacheConfig {
        let config = CacheConfig::default().with_enabled(self.cache_enabled);
        match self.cache_ttl_secs {
            Some(secs) => config.with_ttl(Duration::from_secs(secs)),
            None => config,
        }
    }

    /// Admission control configuration.
    pub fn rate_limiter_config(&self) -> RateLimiterConfig {
        let defaults = RateLimiterConfig::default();
        let limit = self.rate_limit_requests.unwrap_or(defaults.limit());
        let window = self
            .rate_limit_window_ms
            .map_or(defaults.window(), Duration::from_millis);
        RateLimiterConfig::new(limit, window).with_enabled(self.rate_limit_enabled)
    }

    /// Onboarding configuration.
    pub fn onboarding_config(&self) -> OnboardingConfig {
        let defaults = OnboardingConfig::default();
        let base_cost = defaults.password_cost();
        let cost = PasswordHashCost::new(
            self.password_memory_kib.unwrap_or(base_cost.memory_kib()),
            self.password_iterations.unwrap_or(base_cost.iterations()),
            self.password_parallelism
                .unwrap_or(base_cost.parallelism()),
        );
        let config = defaults.with_password_cost(cost);
        match self.invitation_ttl_hours {
            Some(hours) => config.with_invitation_ttl(TimeDelta::hours(i64::from(hours))),
            None => config,
        }
    }
}
