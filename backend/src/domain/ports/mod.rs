//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod account_cache;
mod account_repository;
mod comment_repository;
mod follower_repository;
mod post_repository;
mod request_limiter;
mod role_repository;

#[cfg(test)]
pub use account_cache::MockAccountCache;
pub use account_cache::{AccountCache, AccountCacheError, account_cache_key};
#[cfg(test)]
pub use account_repository::MockAccountRepository;
pub use account_repository::{AccountRepository, AccountRepositoryError, PendingInvitation};
#[cfg(test)]
pub use comment_repository::MockCommentRepository;
pub use comment_repository::{CommentRepository, CommentRepositoryError};
#[cfg(test)]
pub use follower_repository::MockFollowerRepository;
pub use follower_repository::{FollowerRepository, FollowerRepositoryError};
#[cfg(test)]
pub use post_repository::MockPostRepository;
pub use post_repository::{PostRepository, PostRepositoryError};
#[cfg(test)]
pub use request_limiter::MockRequestLimiter;
pub use request_limiter::{
    ClientKey, ClientKeyValidationError, LimitDecision, RequestLimiter, RequestLimiterError,
};
#[cfg(test)]
pub use role_repository::MockRoleRepository;
pub use role_repository::{RoleRepository, RoleRepositoryError};
