//! Port for comment persistence.
use async_trait::async_trait;

use crate::domain::{Comment, NewComment, PostId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by comment repository adapters.
    pub enum CommentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "comment repository connection failed: {message}",
        /// The call did not complete before its deadline.
        Timeout { operation: String } =>
            "comment repository call timed out: {operation}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "comment repository query failed: {message}",
        /// The referenced post does not exist.
        PostNotFound { post_id: i64 } =>
            "post not found: {post_id}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment and return it with the author's username resolved.
    async fn create(&self, comment: &NewComment) -> Result<Comment, CommentRepositoryError>;

    /// Comments on a post, oldest first.
    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, CommentRepositoryError>;
}
