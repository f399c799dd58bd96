//! PostgreSQL-backed `CommentRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{CommentRepository, CommentRepositoryError};
use crate::domain::{Comment, NewComment, PostId};

use super::diesel_helpers::{
    COMMENTS_POST_ID_FKEY, StoreFailure, classify_diesel_error, map_pool_error_message,
    with_deadline,
};
use super::models::{CommentRow, NewCommentRow};
use super::pool::{DbPool, PoolError};
use super::schema::{accounts, comments};

/// Diesel-backed implementation of the `CommentRepository` port.
#[derive(Clone)]
pub struct DieselCommentRepository {
    pool: DbPool,
}

impl DieselCommentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CommentRepositoryError {
    CommentRepositoryError::connection(map_pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error, post_id: PostId) -> CommentRepositoryError {
    let failure = classify_diesel_error(error);
    if failure.violates(COMMENTS_POST_ID_FKEY) {
        return CommentRepositoryError::post_not_found(post_id.get());
    }
    match failure {
        StoreFailure::Connection(message) => CommentRepositoryError::connection(message),
        StoreFailure::Query(message) => CommentRepositoryError::query(message),
        StoreFailure::ForeignKeyViolation { .. } => {
            CommentRepositoryError::query("comment author does not exist")
        }
        StoreFailure::UniqueViolation { .. } | StoreFailure::CheckViolation { .. } => {
            CommentRepositoryError::query("comment constraint violated")
        }
    }
}

#[async_trait]
impl CommentRepository for DieselCommentRepository {
    async fn create(&self, comment: &NewComment) -> Result<Comment, CommentRepositoryError> {
        let post_id = comment.post_id();
        let call = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let (row, author): (CommentRow, String) = conn
                .transaction(|conn| {
                    async move {
                        let row: CommentRow = diesel::insert_into(comments::table)
                            .values(&NewCommentRow {
                                post_id: post_id.get(),
                                author_id: comment.author_id().get(),
                                content: comment.content(),
                            })
                            .returning(CommentRow::as_returning())
                            .get_result(conn)
                            .await?;
                        let author: String = accounts::table
                            .find(row.author_id)
                            .select(accounts::username)
                            .first(conn)
                            .await?;
                        Ok((row, author))
                    }
                    .scope_boxed()
                })
                .await
                .map_err(|error| map_diesel_error(error, post_id))?;
            row.into_comment(author).map_err(CommentRepositoryError::query)
        };
        with_deadline(
            self.pool.query_timeout(),
            "create comment",
            CommentRepositoryError::timeout,
            call,
        )
        .await
    }

    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, CommentRepositoryError> {
        let call = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let rows: Vec<(CommentRow, String)> = comments::table
                .inner_join(accounts::table)
                .filter(comments::post_id.eq(post_id.get()))
                .select((CommentRow::as_select(), accounts::username))
                .order_by((comments::created_at.asc(), comments::id.asc()))
                .load(&mut conn)
                .await
                .map_err(|error| map_diesel_error(error, post_id))?;
            rows.into_iter()
                .map(|(row, author)| {
                    row.into_comment(author)
                        .map_err(CommentRepositoryError::query)
                })
                .collect::<Result<Vec<_>, _>>()
        };
        with_deadline(
            self.pool.query_timeout(),
            "list comments",
            CommentRepositoryError::timeout,
            call,
        )
        .await
    }
}
