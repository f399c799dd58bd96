//! Port for the directed follow graph.
//!
//! Duplicate edges, self-follows and edges to missing accounts are rejected
//! by storage constraints and reported as typed errors, never panics.
use async_trait::async_trait;

use crate::domain::AccountId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by follower repository adapters.
    pub enum FollowerRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "follower repository connection failed: {message}",
        /// The call did not complete before its deadline.
        Timeout { operation: String } =>
            "follower repository call timed out: {operation}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "follower repository query failed: {message}",
        /// The edge already exists.
        AlreadyFollowing =>
            "follow edge already exists",
        /// Follower and followed are the same account.
        SelfFollow =>
            "an account cannot follow itself",
        /// One of the endpoints does not exist.
        UnknownAccount =>
            "follow edge references a missing account",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FollowerRepository: Send + Sync {
    /// Insert the edge `follower -> followed`.
    async fn follow(
        &self,
        follower: AccountId,
        followed: AccountId,
    ) -> Result<(), FollowerRepositoryError>;

    /// Remove the edge. Returns `false` when it did not exist.
    async fn unfollow(
        &self,
        follower: AccountId,
        followed: AccountId,
    ) -> Result<bool, FollowerRepositoryError>;
}
