//! Shared helpers for the Diesel repository implementations.
//!
//! - Classification of Diesel failures by structured error kind and
//!   constraint name, never by message text.
//! - Deadlines around whole store calls, pool checkout included.
//! - Conversions between database integer columns and domain newtypes.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use super::pool::PoolError;

/// Unique constraint on `accounts.email`.
pub const ACCOUNTS_EMAIL_KEY: &str = "accounts_email_key";
/// Unique constraint on `accounts.username`.
pub const ACCOUNTS_USERNAME_KEY: &str = "accounts_username_key";
/// Check constraint forbidding an account following itself.
pub const FOLLOWERS_NO_SELF_FOLLOW: &str = "followers_no_self_follow";
/// Foreign key from `comments.post_id` to `posts.id`.
pub const COMMENTS_POST_ID_FKEY: &str = "comments_post_id_fkey";

/// Store-agnostic view of a failed Diesel call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreFailure {
    /// The connection dropped or could not be used.
    Connection(String),
    /// A unique constraint rejected the write.
    UniqueViolation { constraint: Option<String> },
    /// A foreign key constraint rejected the write.
    ForeignKeyViolation { constraint: Option<String> },
    /// A check constraint rejected the write.
    CheckViolation { constraint: Option<String> },
    /// Any other failure.
    Query(String),
}

impl StoreFailure {
    /// Whether this is a violation of the named constraint.
    pub fn violates(&self, name: &str) -> bool {
        match self {
            Self::UniqueViolation { constraint }
            | Self::ForeignKeyViolation { constraint }
            | Self::CheckViolation { constraint } => constraint.as_deref() == Some(name),
            Self::Connection(_) | Self::Query(_) => false,
        }
    }
}

/// Extract a readable message from a pool error.
pub fn map_pool_error_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

/// Classify a Diesel error and emit debug context.
pub fn classify_diesel_error(error: diesel::result::Error) -> StoreFailure {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => StoreFailure::Query("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => {
            StoreFailure::Query("database query error".to_owned())
        }
        DieselError::DatabaseError(kind, info) => {
            let constraint = info.constraint_name().map(str::to_owned);
            match kind {
                DatabaseErrorKind::UniqueViolation => StoreFailure::UniqueViolation { constraint },
                DatabaseErrorKind::ForeignKeyViolation => {
                    StoreFailure::ForeignKeyViolation { constraint }
                }
                DatabaseErrorKind::CheckViolation => StoreFailure::CheckViolation { constraint },
                DatabaseErrorKind::ClosedConnection
                | DatabaseErrorKind::UnableToSendCommand => {
                    StoreFailure::Connection("database connection error".to_owned())
                }
                _ => StoreFailure::Query("database error".to_owned()),
            }
        }
        _ => StoreFailure::Query("database error".to_owned()),
    }
}

/// Run `call` under `limit`, converting an elapsed deadline with `on_timeout`.
///
/// Dropping the returned future cancels the in-flight call.
pub async fn with_deadline<T, E, F>(
    limit: Duration,
    operation: &'static str,
    on_timeout: impl FnOnce(&'static str) -> E,
    call: F,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    if let Ok(result) = tokio::time::timeout(limit, call).await {
        result
    } else {
        warn!(operation, timeout_ms = limit.as_millis(), "store call exceeded deadline");
        Err(on_timeout(operation))
    }
}

/// Cast a database version column to the domain's unsigned counter.
///
/// Versions start at 1 and only grow, so a negative value is treated as
/// corrupt data.
pub fn version_from_db(version: i32) -> Result<u32, String> {
    u32::try_from(version).map_err(|_| format!("negative post version {version}"))
}

/// Cast a domain version to the database column type.
pub fn version_for_db(version: u32) -> Result<i32, String> {
    i32::try_from(version).map_err(|_| format!("post version {version} exceeds column range"))
}

/// Cast a paging value to a SQL `BIGINT`.
pub fn paging_for_db(value: u32) -> i64 {
    i64::from(value)
}
