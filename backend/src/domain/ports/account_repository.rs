//! Port for account persistence, including the onboarding handshake.
//!
//! Registration and activation are multi-row writes. Adapters must run each
//! of them in a single transaction so that a failure leaves no partial state:
//! no account without its invitation, no activated account whose invitation
//! survives.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Account, AccountId, Email, NewAccount, TokenDigest};

use super::define_port_error;

define_port_error! {
    /// Errors raised by account repository adapters.
    pub enum AccountRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "account repository connection failed: {message}",
        /// The call did not complete before its deadline.
        Timeout { operation: String } =>
            "account repository call timed out: {operation}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "account repository query failed: {message}",
        /// The email unique constraint rejected the insert.
        DuplicateEmail =>
            "an account with that email already exists",
        /// The username unique constraint rejected the insert.
        DuplicateUsername =>
            "an account with that username already exists",
        /// The requested role does not exist.
        UnknownRole { name: String } =>
            "role not found: {name}",
    }
}

/// Invitation row written in the same transaction as a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingInvitation {
    /// Digest of the plaintext token handed to the registrant.
    pub digest: TokenDigest,
    /// Instant after which the invitation no longer activates.
    pub expires_at: DateTime<Utc>,
}

/// Port for account storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert an inactive account and its invitation atomically.
    ///
    /// Duplicate usernames or emails are reported through the dedicated
    /// variants, classified from the violated constraint.
    async fn create_with_invitation(
        &self,
        account: &NewAccount,
        invitation: &PendingInvitation,
    ) -> Result<Account, AccountRepositoryError>;

    /// Consume the invitation matching `digest` and mark its account active.
    ///
    /// Invitations expiring at or before `now` are ignored. Returns `None`
    /// when no live invitation matches, in which case nothing is written.
    async fn activate(
        &self,
        digest: &TokenDigest,
        now: DateTime<Utc>,
    ) -> Result<Option<AccountId>, AccountRepositoryError>;

    /// Remove an account and any outstanding invitations atomically.
    ///
    /// Returns `false` when no account row existed.
    async fn delete(&self, id: AccountId) -> Result<bool, AccountRepositoryError>;

    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountRepositoryError>;

    /// Fetch an account by email address.
    async fn find_by_email(&self, email: &Email)
    -> Result<Option<Account>, AccountRepositoryError>;
}
