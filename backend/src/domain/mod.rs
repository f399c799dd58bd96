//! Domain primitives, services and ports.
//!
//! Purpose: define strongly typed entities (accounts, posts, comments), the
//! services that enforce the consistency rules around them, and the ports
//! through which those services reach storage, caching and admission
//! control.
//!
//! Public surface:
//! - [`Error`] and [`ErrorCode`]: transport-agnostic failure taxonomy.
//! - [`OnboardingService`]: registration, activation and account removal.
//! - [`AccountService`]: cache-aside account reads and follow edges.
//! - [`PostService`]: optimistic post edits, comments and the feed.
//! - [`Admission`] and [`FixedWindowLimiter`]: request admission.

pub mod account;
pub mod accounts;
pub mod comment;
pub mod credentials;
pub mod error;
pub mod onboarding;
pub mod ports;
pub mod post;
pub mod posts;
pub mod rate_limit;
mod service_support;

pub use self::account::{
    ADMIN_ROLE, Account, AccountId, AccountValidationError, DEFAULT_ROLE, Email, MODERATOR_ROLE,
    NewAccount, Role, Username,
};
pub use self::accounts::AccountService;
pub use self::comment::{Comment, NewComment, PostWithComments};
pub use self::credentials::{
    CredentialError, InvitationToken, Password, PasswordHash, PasswordHashCost, TokenDigest,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::onboarding::{
    OnboardingConfig, OnboardingService, Registration, RegistrationRequest,
};
pub use self::post::{
    FeedItem, FeedQuery, NewPost, Post, PostEdit, PostId, PostUpdate, PostValidationError,
    PostVersion, SortDirection,
};
pub use self::posts::PostService;
pub use self::rate_limit::{Admission, FixedWindowLimiter, RateLimiterConfig};

/// Convenient result alias for domain operations.
///
/// # Examples
/// ```
/// use social_backend::domain::{CoreResult, Error};
///
/// fn lookup() -> CoreResult<()> {
///     Err(Error::not_found("nope"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type CoreResult<T> = Result<T, Error>;
