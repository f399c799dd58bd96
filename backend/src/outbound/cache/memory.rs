//! Process-local account cache with clock-driven expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use parking_lot::Mutex;

use crate::domain::ports::{AccountCache, AccountCacheError};
use crate::domain::{Account, AccountId};

#[derive(Debug, Clone)]
struct Entry {
    account: Account,
    expires_at: DateTime<Utc>,
}

/// In-process [`AccountCache`].
///
/// Entries expire `ttl` after they were last written. An expired entry is
/// dropped when read, and writes sweep every expired entry once the cache
/// holds [`InMemoryAccountCache::PRUNE_THRESHOLD`] of them, so keys that are
/// never read again do not accumulate.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use mockable::DefaultClock;
/// use social_backend::outbound::cache::InMemoryAccountCache;
///
/// let cache = InMemoryAccountCache::new(Duration::from_secs(60), Arc::new(DefaultClock));
/// assert!(cache.is_empty());
/// ```
#[derive(Clone)]
pub struct InMemoryAccountCache {
    entries: Arc<Mutex<HashMap<AccountId, Entry>>>,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl InMemoryAccountCache {
    /// Stored entries at or above which `set` sweeps out expired ones.
    pub const PRUNE_THRESHOLD: usize = 1024;

    /// Create an empty cache.
    ///
    /// A `ttl` too large for [`TimeDelta`] saturates to the maximum.
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            clock,
        }
    }

    /// Number of stored entries, live or not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        let now = self.clock.utc();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }
}

#[async_trait]
impl AccountCache for InMemoryAccountCache {
    async fn get(&self, id: AccountId) -> Result<Option<Account>, AccountCacheError> {
        let now = self.clock.utc();
        let mut entries = self.entries.lock();
        match entries.get(&id) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.account.clone())),
            Some(_) => {
                entries.remove(&id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, account: &Account) -> Result<(), AccountCacheError> {
        let now = self.clock.utc();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut entries = self.entries.lock();
        if entries.len() >= Self::PRUNE_THRESHOLD {
            entries.retain(|_, entry| entry.expires_at > now);
        }
        entries.insert(
            account.id,
            Entry {
                account: account.clone(),
                expires_at,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
pub(super) mod tests {
    //! Expiry behaviour against a manual clock.
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::{Email, Role, Username};
    use crate::outbound::memory::ManualClock;

    pub(crate) fn account(id: i64) -> Account {
        Account {
            id: AccountId::new(id),
            username: Username::new(format!("user{id}")).expect("username"),
            email: Email::new(format!("user{id}@x.com")).expect("email"),
            is_active: true,
            role: Role {
                id: 1,
                name: "user".to_owned(),
                description: "A user".to_owned(),
                level: 1,
            },
            created_at: Utc
                .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
                .single()
                .expect("valid timestamp"),
        }
    }

    struct Harness {
        cache: InMemoryAccountCache,
        clock: Arc<ManualClock>,
    }

    #[fixture]
    fn harness() -> Harness {
        let start = Utc
            .with_ymd_and_hms(2026, 4, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp");
        let clock = Arc::new(ManualClock::new(start));
        Harness {
            cache: InMemoryAccountCache::new(Duration::from_secs(60), clock.clone()),
            clock,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn entry_is_served_until_ttl_elapses(harness: Harness) {
        harness.cache.set(&account(1)).await.expect("set");

        harness.clock.advance(Duration::from_secs(59));
        let hit = harness.cache.get(AccountId::new(1)).await.expect("get");
        assert_eq!(hit, Some(account(1)));

        harness.clock.advance(Duration::from_secs(1));
        let miss = harness.cache.get(AccountId::new(1)).await.expect("get");
        assert_eq!(miss, None);
        assert!(harness.cache.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn overwrite_restarts_the_ttl(harness: Harness) {
        harness.cache.set(&account(1)).await.expect("set");
        harness.clock.advance(Duration::from_secs(45));
        harness.cache.set(&account(1)).await.expect("set");
        harness.clock.advance(Duration::from_secs(45));

        let hit = harness.cache.get(AccountId::new(1)).await.expect("get");
        assert!(hit.is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn entries_are_isolated_by_id(harness: Harness) {
        harness.cache.set(&account(1)).await.expect("set");
        harness.cache.set(&account(2)).await.expect("set");

        let first = harness.cache.get(AccountId::new(1)).await.expect("get");
        assert_eq!(first.map(|acc| acc.id), Some(AccountId::new(1)));
        let absent = harness.cache.get(AccountId::new(3)).await.expect("get");
        assert_eq!(absent, None);
        assert_eq!(harness.cache.len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn prune_drops_only_expired_entries(harness: Harness) {
        for id in 1..=50 {
            harness.cache.set(&account(id)).await.expect("set");
        }
        harness.clock.advance(Duration::from_secs(30));
        harness.cache.set(&account(51)).await.expect("set");
        harness.clock.advance(Duration::from_secs(30));

        assert_eq!(harness.cache.prune_expired(), 50);
        assert_eq!(harness.cache.len(), 1);
        let survivor = harness.cache.get(AccountId::new(51)).await.expect("get");
        assert!(survivor.is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn writes_sweep_unread_expired_entries_past_threshold(harness: Harness) {
        let threshold = i64::try_from(InMemoryAccountCache::PRUNE_THRESHOLD).expect("fits");
        for id in 1..=threshold {
            harness.cache.set(&account(id)).await.expect("set");
        }
        assert_eq!(harness.cache.len(), InMemoryAccountCache::PRUNE_THRESHOLD);

        harness.clock.advance(Duration::from_secs(3600));
        harness.cache.set(&account(threshold + 1)).await.expect("set");
        assert_eq!(harness.cache.len(), 1);
    }
}
