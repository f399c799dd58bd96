//! Post data model and feed query parameters.
//!
//! Posts carry a version stamp used for optimistic concurrency: it starts at
//! [`PostVersion::INITIAL`] and grows by exactly one per successful mutation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::{AccountId, Username};

/// Maximum title length in characters.
pub const TITLE_MAX: usize = 100;
/// Maximum content length in characters.
pub const CONTENT_MAX: usize = 1000;
/// Maximum number of posts returned by one feed page.
pub const FEED_LIMIT_MAX: u32 = 20;
/// Maximum search term length in characters.
pub const FEED_SEARCH_MAX: usize = 100;
/// Maximum number of tags a feed query may filter on.
pub const FEED_TAGS_MAX: usize = 5;

/// Validation errors for post payloads and feed queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostValidationError {
    /// Title is blank.
    #[error("title must not be empty")]
    EmptyTitle,
    /// Title exceeds [`TITLE_MAX`].
    #[error("title must be at most {max} characters")]
    TitleTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// Content is blank.
    #[error("content must not be empty")]
    EmptyContent,
    /// Content exceeds [`CONTENT_MAX`].
    #[error("content must be at most {max} characters")]
    ContentTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// An edit changed nothing.
    #[error("edit must change at least one field")]
    EmptyEdit,
    /// Feed limit outside `1..=FEED_LIMIT_MAX`.
    #[error("limit must be between 1 and {max}")]
    LimitOutOfRange {
        /// Maximum accepted limit.
        max: u32,
    },
    /// Search term exceeds [`FEED_SEARCH_MAX`].
    #[error("search must be at most {max} characters")]
    SearchTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// Too many tag filters.
    #[error("at most {max} tags may be supplied")]
    TooManyTags {
        /// Maximum accepted count.
        max: usize,
    },
    /// `since` falls after `until`.
    #[error("since must not be later than until")]
    InvertedTimeRange,
    /// Sort direction outside the allow-list.
    #[error("sort must be either asc or desc")]
    UnknownSort,
}

impl From<PostValidationError> for super::Error {
    fn from(value: PostValidationError) -> Self {
        Self::invalid_request(value.to_string())
    }
}

/// Store-assigned post identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(i64);

impl PostId {
    /// Wrap a raw identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Access the raw identifier.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic version stamp carried by every post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostVersion(u32);

impl PostVersion {
    /// Version assigned on insert.
    pub const INITIAL: Self = Self(1);

    /// Wrap a raw version number.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Access the raw version number.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The version a successful mutation produces.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for PostVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Store-assigned identifier.
    pub id: PostId,
    /// Title, at most [`TITLE_MAX`] characters.
    pub title: String,
    /// Body, at most [`CONTENT_MAX`] characters.
    pub content: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Authoring account.
    pub owner_id: AccountId,
    /// Optimistic concurrency stamp.
    pub version: PostVersion,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last successful mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

fn validate_title(title: &str) -> Result<String, PostValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(PostValidationError::EmptyTitle);
    }
    if trimmed.chars().count() > TITLE_MAX {
        return Err(PostValidationError::TitleTooLong { max: TITLE_MAX });
    }
    Ok(trimmed.to_owned())
}

pub(crate) fn validate_content(content: &str) -> Result<String, PostValidationError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(PostValidationError::EmptyContent);
    }
    if trimmed.chars().count() > CONTENT_MAX {
        return Err(PostValidationError::ContentTooLong { max: CONTENT_MAX });
    }
    Ok(trimmed.to_owned())
}

/// Trim tags, dropping blank and repeated ones while keeping first-seen
/// order.
fn normalise_tags(tags: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for tag in tags {
        let trimmed = tag.trim();
        if !trimmed.is_empty() && !unique.iter().any(|seen| seen == trimmed) {
            unique.push(trimmed.to_owned());
        }
    }
    unique
}

/// Validated insert payload for a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    title: String,
    content: String,
    tags: Vec<String>,
    owner_id: AccountId,
}

impl NewPost {
    /// Validate a new post.
    ///
    /// Tags are trimmed; blank and repeated tags are dropped.
    pub fn new(
        owner_id: AccountId,
        title: &str,
        content: &str,
        tags: impl IntoIterator<Item = String>,
    ) -> Result<Self, PostValidationError> {
        Ok(Self {
            title: validate_title(title)?,
            content: validate_content(content)?,
            tags: normalise_tags(tags),
            owner_id,
        })
    }

    /// Post title.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Post body.
    pub fn content(&self) -> &str {
        self.content.as_str()
    }

    /// Post tags.
    pub fn tags(&self) -> &[String] {
        self.tags.as_slice()
    }

    /// Authoring account.
    pub const fn owner_id(&self) -> AccountId {
        self.owner_id
    }
}

/// Partial edit of a post. Absent fields keep their stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEdit {
    title: Option<String>,
    content: Option<String>,
    tags: Option<Vec<String>>,
}

impl PostEdit {
    /// Validate an edit of the title and/or content. At least one of them
    /// must be supplied; use [`PostEdit::retag`] for a tags-only edit.
    pub fn new(title: Option<&str>, content: Option<&str>) -> Result<Self, PostValidationError> {
        if title.is_none() && content.is_none() {
            return Err(PostValidationError::EmptyEdit);
        }
        Ok(Self {
            title: title.map(validate_title).transpose()?,
            content: content.map(validate_content).transpose()?,
            tags: None,
        })
    }

    /// Edit that replaces the tag set and nothing else. An empty set clears
    /// the post's tags.
    pub fn retag(tags: impl IntoIterator<Item = String>) -> Self {
        Self {
            title: None,
            content: None,
            tags: Some(normalise_tags(tags)),
        }
    }

    /// Also replace the tag set.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags = Some(normalise_tags(tags));
        self
    }

    /// Apply the edit on top of `current`, yielding the compare-and-swap
    /// write guarded by `expected_version`.
    pub fn merged_onto(&self, current: &Post, expected_version: PostVersion) -> PostUpdate {
        PostUpdate {
            id: current.id,
            expected_version,
            title: self.title.clone().unwrap_or_else(|| current.title.clone()),
            content: self
                .content
                .clone()
                .unwrap_or_else(|| current.content.clone()),
            tags: self.tags.clone().unwrap_or_else(|| current.tags.clone()),
        }
    }
}

/// Compare-and-swap write issued against the post store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostUpdate {
    /// Target post.
    pub id: PostId,
    /// Version the caller last observed.
    pub expected_version: PostVersion,
    /// Title to store.
    pub title: String,
    /// Content to store.
    pub content: String,
    /// Tags to store.
    pub tags: Vec<String>,
}

/// Feed ordering by creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Oldest first.
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

impl std::str::FromStr for SortDirection {
    type Err = PostValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(PostValidationError::UnknownSort),
        }
    }
}

/// Validated feed query.
///
/// # Examples
/// ```
/// use social_backend::domain::{FeedQuery, SortDirection};
///
/// let query = FeedQuery::default()
///     .with_limit(5)
///     .and_then(|q| q.with_search("rust"))
///     .expect("valid query");
/// assert_eq!(query.limit(), 5);
/// assert_eq!(query.sort(), SortDirection::Desc);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    limit: u32,
    offset: u32,
    search: Option<String>,
    tags: Vec<String>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    sort: SortDirection,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            limit: FEED_LIMIT_MAX,
            offset: 0,
            search: None,
            tags: Vec::new(),
            since: None,
            until: None,
            sort: SortDirection::Desc,
        }
    }
}

impl FeedQuery {
    /// Page size.
    pub fn with_limit(mut self, limit: u32) -> Result<Self, PostValidationError> {
        if !(1..=FEED_LIMIT_MAX).contains(&limit) {
            return Err(PostValidationError::LimitOutOfRange {
                max: FEED_LIMIT_MAX,
            });
        }
        self.limit = limit;
        Ok(self)
    }

    /// Number of matching posts to skip.
    #[must_use]
    pub const fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Case-insensitive substring filter over title and content.
    pub fn with_search(mut self, search: &str) -> Result<Self, PostValidationError> {
        let trimmed = search.trim();
        if trimmed.chars().count() > FEED_SEARCH_MAX {
            return Err(PostValidationError::SearchTooLong {
                max: FEED_SEARCH_MAX,
            });
        }
        self.search = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        Ok(self)
    }

    /// Posts must carry every supplied tag.
    pub fn with_tags(
        mut self,
        tags: impl IntoIterator<Item = String>,
    ) -> Result<Self, PostValidationError> {
        let tags: Vec<String> = tags
            .into_iter()
            .map(|tag| tag.trim().to_owned())
            .filter(|tag| !tag.is_empty())
            .collect();
        if tags.len() > FEED_TAGS_MAX {
            return Err(PostValidationError::TooManyTags { max: FEED_TAGS_MAX });
        }
        self.tags = tags;
        Ok(self)
    }

    /// Restrict to posts created within `[since, until]`.
    pub fn with_window(
        mut self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Self, PostValidationError> {
        if matches!((since, until), (Some(start), Some(end)) if start > end) {
            return Err(PostValidationError::InvertedTimeRange);
        }
        self.since = since;
        self.until = until;
        Ok(self)
    }

    /// Creation-time ordering.
    #[must_use]
    pub const fn with_sort(mut self, sort: SortDirection) -> Self {
        self.sort = sort;
        self
    }

    /// Page size.
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Rows skipped.
    pub const fn offset(&self) -> u32 {
        self.offset
    }

    /// Search term, if any.
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Required tags.
    pub fn tags(&self) -> &[String] {
        self.tags.as_slice()
    }

    /// Lower creation bound.
    pub const fn since(&self) -> Option<DateTime<Utc>> {
        self.since
    }

    /// Upper creation bound.
    pub const fn until(&self) -> Option<DateTime<Utc>> {
        self.until
    }

    /// Ordering.
    pub const fn sort(&self) -> SortDirection {
        self.sort
    }

    /// Whether `post` passes every filter except the author set.
    pub fn matches(&self, post: &Post) -> bool {
        let search_ok = self.search.as_deref().is_none_or(|term| {
            let needle = term.to_lowercase();
            post.title.to_lowercase().contains(&needle)
                || post.content.to_lowercase().contains(&needle)
        });
        let tags_ok = self.tags.iter().all(|tag| post.tags.contains(tag));
        let since_ok = self.since.is_none_or(|since| post.created_at >= since);
        let until_ok = self.until.is_none_or(|until| post.created_at <= until);
        search_ok && tags_ok && since_ok && until_ok
    }
}

/// Feed row: a post with its author's name and comment count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    /// The post itself.
    pub post: Post,
    /// Author's username.
    pub author: Username,
    /// Number of comments on the post.
    pub comment_count: u64,
}
