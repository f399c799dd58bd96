//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types validate the
//! stored values and report corrupt rows as plain messages.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{
    Account, AccountId, Comment, Email, Post, PostId, PostVersion, Role, Username,
};

use super::diesel_helpers::version_from_db;
use super::schema::{account_invitations, accounts, comments, followers, posts, roles};

/// Row struct for reading from the roles table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RoleRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub level: i64,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            level: row.level,
        }
    }
}

/// Account columns readable by the domain. The password hash is never
/// selected.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AccountRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl AccountRow {
    /// Combine with the joined role row.
    pub fn into_account(self, role: RoleRow) -> Result<Account, String> {
        let username = Username::new(self.username)
            .map_err(|err| format!("account {} has invalid username: {err}", self.id))?;
        let email = Email::new(self.email)
            .map_err(|err| format!("account {} has invalid email: {err}", self.id))?;
        Ok(Account {
            id: AccountId::new(self.id),
            username,
            email,
            is_active: self.is_active,
            role: role.into(),
            created_at: self.created_at,
        })
    }
}

/// Insertable struct for registration.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = accounts)]
pub(crate) struct NewAccountRow<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub is_active: bool,
    pub role_id: i64,
}

/// Insertable struct for an invitation issued at registration.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = account_invitations)]
pub(crate) struct NewInvitationRow<'a> {
    pub token_digest: &'a str,
    pub account_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Row struct for reading from the posts table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PostRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub owner_id: i64,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = String;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PostId::new(row.id),
            title: row.title,
            content: row.content,
            tags: row.tags,
            owner_id: AccountId::new(row.owner_id),
            version: PostVersion::new(version_from_db(row.version)?),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Insertable struct for new posts. Version and timestamps take column
/// defaults.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = posts)]
pub(crate) struct NewPostRow<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub tags: &'a [String],
    pub owner_id: i64,
}

/// Row struct for reading from the comments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl CommentRow {
    /// Combine with the author's username.
    pub fn into_comment(self, author: String) -> Result<Comment, String> {
        let author = Username::new(author)
            .map_err(|err| format!("comment {} has invalid author name: {err}", self.id))?;
        Ok(Comment {
            id: self.id,
            post_id: PostId::new(self.post_id),
            author_id: AccountId::new(self.author_id),
            author,
            content: self.content,
            created_at: self.created_at,
        })
    }
}

/// Insertable struct for new comments.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comments)]
pub(crate) struct NewCommentRow<'a> {
    pub post_id: i64,
    pub author_id: i64,
    pub content: &'a str,
}

/// Insertable struct for a follow edge.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = followers)]
pub(crate) struct NewFollowerRow {
    pub follower_id: i64,
    pub followed_id: i64,
}
