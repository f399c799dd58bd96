//! In-memory comment store.

use async_trait::async_trait;

use crate::domain::ports::{CommentRepository, CommentRepositoryError};
use crate::domain::{AccountId, Comment, NewComment, PostId};

use super::{CommentRow, InMemoryDatabase};

/// [`CommentRepository`] over [`InMemoryDatabase`] tables.
#[derive(Clone)]
pub struct InMemoryCommentRepository {
    db: InMemoryDatabase,
}

impl InMemoryCommentRepository {
    pub(super) fn new(db: InMemoryDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn create(&self, comment: &NewComment) -> Result<Comment, CommentRepositoryError> {
        let now = self.db.now();
        let mut tables = self.db.tables.lock();
        let post_id = comment.post_id().get();
        if !tables.posts.contains_key(&post_id) {
            return Err(CommentRepositoryError::post_not_found(post_id));
        }
        let author = tables
            .username(comment.author_id().get())
            .ok_or_else(|| {
                CommentRepositoryError::query(format!(
                    "author {} does not exist",
                    comment.author_id()
                ))
            })?;

        let id = tables.next_comment_id;
        tables.next_comment_id += 1;
        tables.comments.push(CommentRow {
            id,
            post_id,
            author_id: comment.author_id().get(),
            content: comment.content().to_owned(),
            created_at: now,
        });
        Ok(Comment {
            id,
            post_id: comment.post_id(),
            author_id: comment.author_id(),
            author,
            content: comment.content().to_owned(),
            created_at: now,
        })
    }

    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, CommentRepositoryError> {
        let tables = self.db.tables.lock();
        let mut rows: Vec<&CommentRow> = tables
            .comments
            .iter()
            .filter(|row| row.post_id == post_id.get())
            .collect();
        rows.sort_by_key(|row| (row.created_at, row.id));
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                Some(Comment {
                    id: row.id,
                    post_id,
                    author_id: AccountId::new(row.author_id),
                    author: tables.username(row.author_id)?,
                    content: row.content.clone(),
                    created_at: row.created_at,
                })
            })
            .collect())
    }
}
