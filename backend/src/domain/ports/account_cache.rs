//! Port interface for the time-bounded account cache.
use async_trait::async_trait;

use crate::domain::{Account, AccountId};

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by account cache adapters.
    pub enum AccountCacheError {
        /// Cache backend is unavailable or timing out.
        Backend { message: String } => "account cache backend failure: {message}",
        /// Serialisation or deserialisation of cached content failed.
        Serialization { message: String } => "account cache serialisation failed: {message}",
    }
}

/// Key under which an account is cached.
///
/// # Examples
/// ```
/// use social_backend::domain::AccountId;
/// use social_backend::domain::ports::account_cache_key;
///
/// assert_eq!(account_cache_key(AccountId::new(42)), "account-42");
/// ```
pub fn account_cache_key(id: AccountId) -> String {
    format!("account-{id}")
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCache: Send + Sync {
    /// Read a cached account. Absence is `Ok(None)`, not an error.
    async fn get(&self, id: AccountId) -> Result<Option<Account>, AccountCacheError>;

    /// Store an account under its id, replacing any entry and restarting its
    /// time-to-live.
    async fn set(&self, account: &Account) -> Result<(), AccountCacheError>;
}
