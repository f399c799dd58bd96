//! Port error translation shared by the domain services.
//!
//! Connection failures and elapsed deadlines become
//! [`ErrorCode::ServiceUnavailable`](super::ErrorCode::ServiceUnavailable);
//! anything else the store reports without a dedicated meaning becomes
//! [`ErrorCode::StorageError`](super::ErrorCode::StorageError).

use super::Error;
use super::ports::{
    AccountRepositoryError, CommentRepositoryError, FollowerRepositoryError, PostRepositoryError,
    RoleRepositoryError,
};

pub(crate) fn map_account_repository_error(error: AccountRepositoryError) -> Error {
    match error {
        AccountRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("account store unavailable: {message}"))
        }
        AccountRepositoryError::Timeout { operation } => {
            Error::service_unavailable(format!("account store timed out during {operation}"))
        }
        AccountRepositoryError::Query { message } => {
            Error::storage(format!("account store error: {message}"))
        }
        AccountRepositoryError::DuplicateEmail => Error::duplicate_email(),
        AccountRepositoryError::DuplicateUsername => Error::duplicate_username(),
        AccountRepositoryError::UnknownRole { name } => {
            Error::invalid_request(format!("unknown role: {name}"))
        }
    }
}

pub(crate) fn map_role_repository_error(error: RoleRepositoryError) -> Error {
    match error {
        RoleRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("role store unavailable: {message}"))
        }
        RoleRepositoryError::Timeout { operation } => {
            Error::service_unavailable(format!("role store timed out during {operation}"))
        }
        RoleRepositoryError::Query { message } => {
            Error::storage(format!("role store error: {message}"))
        }
    }
}

pub(crate) fn map_post_repository_error(error: PostRepositoryError) -> Error {
    match error {
        PostRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("post store unavailable: {message}"))
        }
        PostRepositoryError::Timeout { operation } => {
            Error::service_unavailable(format!("post store timed out during {operation}"))
        }
        PostRepositoryError::Query { message } => {
            Error::storage(format!("post store error: {message}"))
        }
    }
}

pub(crate) fn map_comment_repository_error(error: CommentRepositoryError) -> Error {
    match error {
        CommentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("comment store unavailable: {message}"))
        }
        CommentRepositoryError::Timeout { operation } => {
            Error::service_unavailable(format!("comment store timed out during {operation}"))
        }
        CommentRepositoryError::Query { message } => {
            Error::storage(format!("comment store error: {message}"))
        }
        CommentRepositoryError::PostNotFound { post_id } => {
            Error::not_found(format!("post {post_id} not found"))
        }
    }
}

pub(crate) fn map_follower_repository_error(error: FollowerRepositoryError) -> Error {
    match error {
        FollowerRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("follower store unavailable: {message}"))
        }
        FollowerRepositoryError::Timeout { operation } => {
            Error::service_unavailable(format!("follower store timed out during {operation}"))
        }
        FollowerRepositoryError::Query { message } => {
            Error::storage(format!("follower store error: {message}"))
        }
        FollowerRepositoryError::AlreadyFollowing => Error::conflict("already following"),
        FollowerRepositoryError::SelfFollow => Error::conflict("an account cannot follow itself"),
        FollowerRepositoryError::UnknownAccount => {
            Error::conflict("follow edge references a missing account")
        }
    }
}
