//! PostgreSQL-backed `FollowerRepository` implementation using Diesel ORM.
//!
//! The primary key rejects duplicate edges, `followers_no_self_follow`
//! rejects self-follows and the foreign keys reject missing accounts.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::AccountId;
use crate::domain::ports::{FollowerRepository, FollowerRepositoryError};

use super::diesel_helpers::{
    FOLLOWERS_NO_SELF_FOLLOW, StoreFailure, classify_diesel_error, map_pool_error_message,
    with_deadline,
};
use super::models::NewFollowerRow;
use super::pool::{DbPool, PoolError};
use super::schema::followers;

/// Diesel-backed implementation of the `FollowerRepository` port.
#[derive(Clone)]
pub struct DieselFollowerRepository {
    pool: DbPool,
}

impl DieselFollowerRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> FollowerRepositoryError {
    FollowerRepositoryError::connection(map_pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> FollowerRepositoryError {
    let failure = classify_diesel_error(error);
    if failure.violates(FOLLOWERS_NO_SELF_FOLLOW) {
        return FollowerRepositoryError::self_follow();
    }
    match failure {
        StoreFailure::UniqueViolation { .. } => FollowerRepositoryError::already_following(),
        StoreFailure::ForeignKeyViolation { .. } => FollowerRepositoryError::unknown_account(),
        StoreFailure::Connection(message) => FollowerRepositoryError::connection(message),
        StoreFailure::Query(message) => FollowerRepositoryError::query(message),
        StoreFailure::CheckViolation { .. } => {
            FollowerRepositoryError::query("follower constraint violated")
        }
    }
}

#[async_trait]
impl FollowerRepository for DieselFollowerRepository {
    async fn follow(
        &self,
        follower: AccountId,
        followed: AccountId,
    ) -> Result<(), FollowerRepositoryError> {
        if follower == followed {
            return Err(FollowerRepositoryError::self_follow());
        }
        let call = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            diesel::insert_into(followers::table)
                .values(NewFollowerRow {
                    follower_id: follower.get(),
                    followed_id: followed.get(),
                })
                .execute(&mut conn)
                .await
                .map(|_| ())
                .map_err(map_diesel_error)
        };
        with_deadline(
            self.pool.query_timeout(),
            "follow account",
            FollowerRepositoryError::timeout,
            call,
        )
        .await
    }

    async fn unfollow(
        &self,
        follower: AccountId,
        followed: AccountId,
    ) -> Result<bool, FollowerRepositoryError> {
        let call = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let removed = diesel::delete(
                followers::table
                    .filter(followers::follower_id.eq(follower.get()))
                    .filter(followers::followed_id.eq(followed.get())),
            )
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
            Ok::<_, FollowerRepositoryError>(removed > 0)
        };
        with_deadline(
            self.pool.query_timeout(),
            "unfollow account",
            FollowerRepositoryError::timeout,
            call,
        )
        .await
    }
}
