//! Account reads and the follow graph.
//!
//! [`AccountService::get_by_id`] is the cache-aside read path: consult the
//! cache, fall back to the store on a miss, then populate the cache. Cache
//! failures never fail the read.

use std::sync::Arc;

use tracing::warn;

use super::ports::{AccountCache, AccountRepository, FollowerRepository};
use super::service_support::{map_account_repository_error, map_follower_repository_error};
use super::{Account, AccountId, Email, Error};

/// Account lookups and follow-edge maintenance.
#[derive(Clone)]
pub struct AccountService<A, C, F> {
    accounts: Arc<A>,
    cache: Arc<C>,
    followers: Arc<F>,
}

impl<A, C, F> AccountService<A, C, F> {
    /// Create a service over the account store, its cache and the follow
    /// graph.
    pub fn new(accounts: Arc<A>, cache: Arc<C>, followers: Arc<F>) -> Self {
        Self {
            accounts,
            cache,
            followers,
        }
    }
}

impl<A, C, F> AccountService<A, C, F>
where
    A: AccountRepository,
    C: AccountCache,
    F: FollowerRepository,
{
    /// Fetch an account, preferring the cached copy.
    pub async fn get_by_id(&self, id: AccountId) -> Result<Account, Error> {
        match self.cache.get(id).await {
            Ok(Some(account)) => return Ok(account),
            Ok(None) => {}
            Err(error) => {
                warn!(account_id = %id, %error, "account cache read failed; reading store");
            }
        }

        let account = self
            .accounts
            .find_by_id(id)
            .await
            .map_err(map_account_repository_error)?
            .ok_or_else(|| Error::not_found(format!("account {id} not found")))?;

        if let Err(error) = self.cache.set(&account).await {
            warn!(account_id = %id, %error, "account cache write failed");
        }
        Ok(account)
    }

    /// Fetch an account by email, bypassing the cache.
    pub async fn get_by_email(&self, email: &Email) -> Result<Account, Error> {
        self.accounts
            .find_by_email(email)
            .await
            .map_err(map_account_repository_error)?
            .ok_or_else(|| Error::not_found("account not found"))
    }

    /// Make `follower` follow `followed`.
    ///
    /// Self-follows, duplicate edges and edges to missing accounts are
    /// [`ErrorCode::Conflict`](super::ErrorCode::Conflict).
    pub async fn follow(&self, follower: AccountId, followed: AccountId) -> Result<(), Error> {
        if follower == followed {
            return Err(Error::conflict("an account cannot follow itself"));
        }
        self.followers
            .follow(follower, followed)
            .await
            .map_err(map_follower_repository_error)
    }

    /// Remove the edge `follower -> followed`. Removing a missing edge is not
    /// an error.
    pub async fn unfollow(&self, follower: AccountId, followed: AccountId) -> Result<(), Error> {
        self.followers
            .unfollow(follower, followed)
            .await
            .map(|_| ())
            .map_err(map_follower_repository_error)
    }
}
