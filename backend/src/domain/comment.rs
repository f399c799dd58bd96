//! Comments attached to posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::{AccountId, Username};
use super::post::{PostId, PostValidationError, validate_content};

/// Persisted comment with its author's username resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Store-assigned identifier.
    pub id: i64,
    /// Post the comment belongs to.
    pub post_id: PostId,
    /// Authoring account.
    pub author_id: AccountId,
    /// Author's username at read time.
    pub author: Username,
    /// Comment body.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validated insert payload for a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    post_id: PostId,
    author_id: AccountId,
    content: String,
}

impl NewComment {
    /// Validate a comment body.
    pub fn new(
        post_id: PostId,
        author_id: AccountId,
        content: &str,
    ) -> Result<Self, PostValidationError> {
        Ok(Self {
            post_id,
            author_id,
            content: validate_content(content)?,
        })
    }

    /// Target post.
    pub const fn post_id(&self) -> PostId {
        self.post_id
    }

    /// Authoring account.
    pub const fn author_id(&self) -> AccountId {
        self.author_id
    }

    /// Comment body.
    pub fn content(&self) -> &str {
        self.content.as_str()
    }
}

/// A post together with its comments, oldest comment first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWithComments {
    /// The post.
    pub post: super::post::Post,
    /// Its comments.
    pub comments: Vec<Comment>,
}
