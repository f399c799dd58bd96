//! Post use-cases: authoring, optimistic edits, comments and the feed.
//!
//! Edits and deletes of someone else's post require the actor's role to meet
//! the moderator or admin level respectively. The version check itself is a
//! single conditional write in the store; a stale version and a vanished row
//! both surface as [`ErrorCode::NotFound`](super::ErrorCode::NotFound).
//! Retrying after a conflict is the caller's decision.

use std::sync::Arc;

use tracing::debug;

use super::ports::{CommentRepository, PostRepository, RoleRepository};
use super::service_support::{
    map_comment_repository_error, map_post_repository_error, map_role_repository_error,
};
use super::{
    ADMIN_ROLE, Account, AccountId, Comment, Error, FeedItem, FeedQuery, MODERATOR_ROLE,
    NewComment, NewPost, Post, PostEdit, PostId, PostVersion, PostWithComments,
};

/// Post authoring and reading.
#[derive(Clone)]
pub struct PostService<P, C, R> {
    posts: Arc<P>,
    comments: Arc<C>,
    roles: Arc<R>,
}

impl<P, C, R> PostService<P, C, R> {
    /// Create a service over the post, comment and role stores.
    pub fn new(posts: Arc<P>, comments: Arc<C>, roles: Arc<R>) -> Self {
        Self {
            posts,
            comments,
            roles,
        }
    }
}

impl<P, C, R> PostService<P, C, R>
where
    P: PostRepository,
    C: CommentRepository,
    R: RoleRepository,
{
    /// Store a new post at the initial version.
    pub async fn create(&self, post: &NewPost) -> Result<Post, Error> {
        let created = self
            .posts
            .create(post)
            .await
            .map_err(map_post_repository_error)?;
        debug!(post_id = %created.id, owner_id = %created.owner_id, "created post");
        Ok(created)
    }

    /// Fetch a post.
    pub async fn get_by_id(&self, id: PostId) -> Result<Post, Error> {
        self.posts
            .find_by_id(id)
            .await
            .map_err(map_post_repository_error)?
            .ok_or_else(|| Error::not_found(format!("post {id} not found")))
    }

    /// Fetch a post and its comments, oldest comment first.
    pub async fn get_with_comments(&self, id: PostId) -> Result<PostWithComments, Error> {
        let post = self.get_by_id(id).await?;
        let comments = self
            .comments
            .list_for_post(id)
            .await
            .map_err(map_comment_repository_error)?;
        Ok(PostWithComments { post, comments })
    }

    /// Apply `edit` if the stored version still equals `expected_version`.
    ///
    /// On success the returned post carries `expected_version + 1`.
    pub async fn update(
        &self,
        actor: &Account,
        id: PostId,
        expected_version: PostVersion,
        edit: &PostEdit,
    ) -> Result<Post, Error> {
        let current = self.get_by_id(id).await?;
        self.authorise(actor, &current, MODERATOR_ROLE).await?;

        let update = edit.merged_onto(&current, expected_version);
        let updated = self
            .posts
            .update(&update)
            .await
            .map_err(map_post_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!("post {id} not found at version {expected_version}"))
            })?;
        debug!(post_id = %id, version = %updated.version, "updated post");
        Ok(updated)
    }

    /// Hard-delete a post.
    pub async fn delete(&self, actor: &Account, id: PostId) -> Result<(), Error> {
        let current = self.get_by_id(id).await?;
        self.authorise(actor, &current, ADMIN_ROLE).await?;

        let deleted = self
            .posts
            .delete(id)
            .await
            .map_err(map_post_repository_error)?;
        if deleted {
            Ok(())
        } else {
            Err(Error::not_found(format!("post {id} not found")))
        }
    }

    /// Personalised feed for `viewer`.
    pub async fn feed(&self, viewer: AccountId, query: &FeedQuery) -> Result<Vec<FeedItem>, Error> {
        self.posts
            .feed(viewer, query)
            .await
            .map_err(map_post_repository_error)
    }

    /// Attach a comment to an existing post.
    pub async fn add_comment(&self, comment: &NewComment) -> Result<Comment, Error> {
        self.comments
            .create(comment)
            .await
            .map_err(map_comment_repository_error)
    }

    async fn authorise(&self, actor: &Account, post: &Post, required: &str) -> Result<(), Error> {
        if post.owner_id == actor.id {
            return Ok(());
        }
        let required_role = self
            .roles
            .find_by_name(required)
            .await
            .map_err(map_role_repository_error)?
            .ok_or_else(|| Error::storage(format!("role {required} is not provisioned")))?;
        if actor.role.has_precedence_over(&required_role) {
            Ok(())
        } else {
            Err(Error::forbidden(format!(
                "{required} role required to modify post {}",
                post.id
            )))
        }
    }
}

#[cfg(test)]
#[path = "posts_tests.rs"]
mod tests;
