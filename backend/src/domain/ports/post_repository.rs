//! Port for post persistence with optimistic concurrency.
//!
//! # Version semantics
//!
//! - Inserted posts start at [`PostVersion::INITIAL`](crate::domain::PostVersion::INITIAL).
//! - [`PostRepository::update`] writes only when the stored version equals
//!   [`PostUpdate::expected_version`] and bumps it by exactly one.
//! - A stale version and a missing row both yield `Ok(None)`; adapters do
//!   not issue a second read to tell them apart.

use async_trait::async_trait;

use crate::domain::{AccountId, FeedItem, FeedQuery, NewPost, Post, PostId, PostUpdate};

use super::define_port_error;

define_port_error! {
    /// Errors raised by post repository adapters.
    pub enum PostRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "post repository connection failed: {message}",
        /// The call did not complete before its deadline.
        Timeout { operation: String } =>
            "post repository call timed out: {operation}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "post repository query failed: {message}",
    }
}

/// Port for post storage and the personalised feed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post at the initial version.
    async fn create(&self, post: &NewPost) -> Result<Post, PostRepositoryError>;

    /// Fetch a post by identifier.
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PostRepositoryError>;

    /// Compare-and-swap update keyed on id and expected version.
    ///
    /// Returns the stored post at its new version, or `None` when zero rows
    /// matched.
    async fn update(&self, update: &PostUpdate) -> Result<Option<Post>, PostRepositoryError>;

    /// Hard-delete a post. Returns `false` when no row matched.
    async fn delete(&self, id: PostId) -> Result<bool, PostRepositoryError>;

    /// Posts by `viewer` or by accounts `viewer` follows, filtered and paged
    /// according to `query`.
    async fn feed(
        &self,
        viewer: AccountId,
        query: &FeedQuery,
    ) -> Result<Vec<FeedItem>, PostRepositoryError>;
}
