//! PostgreSQL-backed `PostRepository` implementation using Diesel ORM.
//!
//! Updates are a single conditional `UPDATE ... WHERE id = $1 AND version =
//! $2 RETURNING *`, so exactly one writer wins per version. A zero-row update
//! is reported as `None` without a second read.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::{count_star, now};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PostRepository, PostRepositoryError};
use crate::domain::{
    AccountId, FeedItem, FeedQuery, NewPost, Post, PostId, PostUpdate, SortDirection, Username,
};

use super::diesel_helpers::{
    StoreFailure, classify_diesel_error, map_pool_error_message, paging_for_db, version_for_db,
    with_deadline,
};
use super::models::{NewPostRow, PostRow};
use super::pool::{DbPool, PoolError};
use super::schema::{accounts, comments, followers, posts};

/// Diesel-backed implementation of the `PostRepository` port.
#[derive(Clone)]
pub struct DieselPostRepository {
    pool: DbPool,
}

impl DieselPostRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PostRepositoryError {
    PostRepositoryError::connection(map_pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> PostRepositoryError {
    match classify_diesel_error(error) {
        StoreFailure::Connection(message) => PostRepositoryError::connection(message),
        StoreFailure::Query(message) => PostRepositoryError::query(message),
        StoreFailure::ForeignKeyViolation { .. } => {
            PostRepositoryError::query("post owner does not exist")
        }
        StoreFailure::UniqueViolation { .. } | StoreFailure::CheckViolation { .. } => {
            PostRepositoryError::query("post constraint violated")
        }
    }
}

fn into_post(row: PostRow) -> Result<Post, PostRepositoryError> {
    Post::try_from(row).map_err(PostRepositoryError::query)
}

/// Escape `LIKE` metacharacters so the search term matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn into_feed_item(
    (row, author): (PostRow, String),
    counts: &HashMap<i64, i64>,
) -> Result<FeedItem, PostRepositoryError> {
    let comment_count = counts.get(&row.id).copied().unwrap_or(0);
    let author = Username::new(author).map_err(|err| {
        PostRepositoryError::query(format!("post {} has invalid author name: {err}", row.id))
    })?;
    Ok(FeedItem {
        post: into_post(row)?,
        author,
        comment_count: u64::try_from(comment_count).unwrap_or(0),
    })
}

#[async_trait]
impl PostRepository for DieselPostRepository {
    async fn create(&self, post: &NewPost) -> Result<Post, PostRepositoryError> {
        let call = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: PostRow = diesel::insert_into(posts::table)
                .values(&NewPostRow {
                    title: post.title(),
                    content: post.content(),
                    tags: post.tags(),
                    owner_id: post.owner_id().get(),
                })
                .returning(PostRow::as_returning())
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            into_post(row)
        };
        with_deadline(
            self.pool.query_timeout(),
            "create post",
            PostRepositoryError::timeout,
            call,
        )
        .await
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PostRepositoryError> {
        let call = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<PostRow> = posts::table
                .find(id.get())
                .select(PostRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            row.map(into_post).transpose()
        };
        with_deadline(
            self.pool.query_timeout(),
            "find post by id",
            PostRepositoryError::timeout,
            call,
        )
        .await
    }

    async fn update(&self, update: &PostUpdate) -> Result<Option<Post>, PostRepositoryError> {
        let expected =
            version_for_db(update.expected_version.get()).map_err(PostRepositoryError::query)?;
        let call = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<PostRow> = diesel::update(
                posts::table
                    .filter(posts::id.eq(update.id.get()))
                    .filter(posts::version.eq(expected)),
            )
            .set((
                posts::title.eq(update.title.as_str()),
                posts::content.eq(update.content.as_str()),
                posts::tags.eq(&update.tags),
                posts::version.eq(posts::version + 1),
                posts::updated_at.eq(now),
            ))
            .returning(PostRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
            row.map(into_post).transpose()
        };
        with_deadline(
            self.pool.query_timeout(),
            "update post",
            PostRepositoryError::timeout,
            call,
        )
        .await
    }

    async fn delete(&self, id: PostId) -> Result<bool, PostRepositoryError> {
        let call = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let removed = diesel::delete(posts::table.find(id.get()))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            Ok::<_, PostRepositoryError>(removed > 0)
        };
        with_deadline(
            self.pool.query_timeout(),
            "delete post",
            PostRepositoryError::timeout,
            call,
        )
        .await
    }

    async fn feed(
        &self,
        viewer: AccountId,
        query: &FeedQuery,
    ) -> Result<Vec<FeedItem>, PostRepositoryError> {
        let call = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;

            let followed = followers::table
                .filter(followers::follower_id.eq(viewer.get()))
                .select(followers::followed_id);
            let mut statement = posts::table
                .inner_join(accounts::table)
                .filter(
                    posts::owner_id
                        .eq(viewer.get())
                        .or(posts::owner_id.eq_any(followed)),
                )
                .select((PostRow::as_select(), accounts::username))
                .into_boxed();

            if let Some(term) = query.search() {
                let pattern = like_pattern(term);
                statement = statement.filter(
                    posts::title
                        .ilike(pattern.clone())
                        .or(posts::content.ilike(pattern)),
                );
            }
            if !query.tags().is_empty() {
                statement = statement.filter(posts::tags.contains(query.tags().to_vec()));
            }
            if let Some(since) = query.since() {
                statement = statement.filter(posts::created_at.ge(since));
            }
            if let Some(until) = query.until() {
                statement = statement.filter(posts::created_at.le(until));
            }
            statement = match query.sort() {
                SortDirection::Asc => statement.order((posts::created_at.asc(), posts::id.asc())),
                SortDirection::Desc => {
                    statement.order((posts::created_at.desc(), posts::id.desc()))
                }
            };

            let rows: Vec<(PostRow, String)> = statement
                .limit(paging_for_db(query.limit()))
                .offset(paging_for_db(query.offset()))
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;

            let ids: Vec<i64> = rows.iter().map(|(row, _)| row.id).collect();
            let counts: HashMap<i64, i64> = if ids.is_empty() {
                HashMap::new()
            } else {
                comments::table
                    .filter(comments::post_id.eq_any(ids))
                    .group_by(comments::post_id)
                    .select((comments::post_id, count_star()))
                    .load::<(i64, i64)>(&mut conn)
                    .await
                    .map_err(map_diesel_error)?
                    .into_iter()
                    .collect()
            };

            rows.into_iter()
                .map(|row| into_feed_item(row, &counts))
                .collect::<Result<Vec<_>, _>>()
        };
        with_deadline(
            self.pool.query_timeout(),
            "load feed",
            PostRepositoryError::timeout,
            call,
        )
        .await
    }
}
