//! In-memory post store with compare-and-swap updates.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::domain::ports::{PostRepository, PostRepositoryError};
use crate::domain::{
    AccountId, FeedItem, FeedQuery, NewPost, Post, PostId, PostUpdate, PostVersion, SortDirection,
};

use super::InMemoryDatabase;

/// [`PostRepository`] over [`InMemoryDatabase`] tables.
#[derive(Clone)]
pub struct InMemoryPostRepository {
    db: InMemoryDatabase,
}

impl InMemoryPostRepository {
    pub(super) fn new(db: InMemoryDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, post: &NewPost) -> Result<Post, PostRepositoryError> {
        let now = self.db.now();
        let mut tables = self.db.tables.lock();
        if !tables.accounts.contains_key(&post.owner_id().get()) {
            return Err(PostRepositoryError::query(format!(
                "owner {} does not exist",
                post.owner_id()
            )));
        }
        let id = tables.next_post_id;
        tables.next_post_id += 1;
        let stored = Post {
            id: PostId::new(id),
            title: post.title().to_owned(),
            content: post.content().to_owned(),
            tags: post.tags().to_vec(),
            owner_id: post.owner_id(),
            version: PostVersion::INITIAL,
            created_at: now,
            updated_at: now,
        };
        tables.posts.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PostRepositoryError> {
        Ok(self.db.tables.lock().posts.get(&id.get()).cloned())
    }

    async fn update(&self, update: &PostUpdate) -> Result<Option<Post>, PostRepositoryError> {
        let now = self.db.now();
        let mut tables = self.db.tables.lock();
        let Some(post) = tables
            .posts
            .get_mut(&update.id.get())
            .filter(|post| post.version == update.expected_version)
        else {
            return Ok(None);
        };
        post.title.clone_from(&update.title);
        post.content.clone_from(&update.content);
        post.tags.clone_from(&update.tags);
        post.version = post.version.next();
        post.updated_at = now;
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: PostId) -> Result<bool, PostRepositoryError> {
        let mut tables = self.db.tables.lock();
        if tables.posts.remove(&id.get()).is_none() {
            return Ok(false);
        }
        tables.comments.retain(|row| row.post_id != id.get());
        Ok(true)
    }

    async fn feed(
        &self,
        viewer: AccountId,
        query: &FeedQuery,
    ) -> Result<Vec<FeedItem>, PostRepositoryError> {
        let tables = self.db.tables.lock();
        let mut authors: BTreeSet<i64> = tables
            .followers
            .iter()
            .filter(|(follower, _)| *follower == viewer.get())
            .map(|(_, followed)| *followed)
            .collect();
        authors.insert(viewer.get());

        let mut matching: Vec<&Post> = tables
            .posts
            .values()
            .filter(|post| authors.contains(&post.owner_id.get()) && query.matches(post))
            .collect();
        matching.sort_by_key(|post| (post.created_at, post.id));
        if query.sort() == SortDirection::Desc {
            matching.reverse();
        }

        let items = matching
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(query.limit()).unwrap_or(usize::MAX))
            .filter_map(|post| {
                let author = tables.username(post.owner_id.get())?;
                let comment_count = tables
                    .comments
                    .iter()
                    .filter(|row| row.post_id == post.id.get())
                    .count();
                Some(FeedItem {
                    post: post.clone(),
                    author,
                    comment_count: u64::try_from(comment_count).unwrap_or(u64::MAX),
                })
            })
            .collect();
        Ok(items)
    }
}
