//! Account onboarding: registration, activation and removal.
//!
//! An account moves `Registered -> Invited -> Activated`. Registration writes
//! the inactive account and its invitation in one transaction, so the
//! intermediate `Registered` state is never observable. Activation consumes
//! the invitation and flips the flag in one transaction; expiry is evaluated
//! lazily against the injected clock.

use std::fmt;
use std::sync::Arc;

use chrono::TimeDelta;
use mockable::Clock;
use tracing::debug;

use super::ports::{AccountRepository, PendingInvitation};
use super::service_support::map_account_repository_error;
use super::{
    Account, AccountId, CredentialError, DEFAULT_ROLE, Email, Error, InvitationToken, NewAccount,
    Password, PasswordHashCost, Username,
};

/// Tunables for the onboarding workflow.
///
/// # Examples
/// ```
/// use chrono::TimeDelta;
/// use social_backend::domain::OnboardingConfig;
///
/// let config = OnboardingConfig::default();
/// assert_eq!(config.invitation_ttl(), TimeDelta::days(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingConfig {
    invitation_ttl: TimeDelta,
    password_cost: PasswordHashCost,
    default_role: String,
}

impl OnboardingConfig {
    /// Default invitation lifetime in days.
    const DEFAULT_INVITATION_TTL_DAYS: i64 = 3;

    /// Set how long an invitation stays redeemable.
    #[must_use]
    pub fn with_invitation_ttl(mut self, ttl: TimeDelta) -> Self {
        self.invitation_ttl = ttl;
        self
    }

    /// Set the Argon2id cost used for new password hashes.
    #[must_use]
    pub fn with_password_cost(mut self, cost: PasswordHashCost) -> Self {
        self.password_cost = cost;
        self
    }

    /// Set the role assigned to new accounts.
    #[must_use]
    pub fn with_default_role(mut self, role: impl Into<String>) -> Self {
        self.default_role = role.into();
        self
    }

    /// Invitation lifetime.
    pub const fn invitation_ttl(&self) -> TimeDelta {
        self.invitation_ttl
    }

    /// Argon2id cost.
    pub const fn password_cost(&self) -> PasswordHashCost {
        self.password_cost
    }

    /// Role assigned to new accounts.
    pub fn default_role(&self) -> &str {
        self.default_role.as_str()
    }
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            invitation_ttl: TimeDelta::days(Self::DEFAULT_INVITATION_TTL_DAYS),
            password_cost: PasswordHashCost::default(),
            default_role: DEFAULT_ROLE.to_owned(),
        }
    }
}

/// Raw registration input as received from the transport layer.
pub struct RegistrationRequest {
    /// Requested username.
    pub username: String,
    /// Requested email.
    pub email: String,
    /// Plaintext password; wiped once hashed.
    pub password: String,
}

impl fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful registration: the stored account and the one-time token.
///
/// The plaintext token is not persisted anywhere; this is the only place it
/// can be read.
#[derive(Debug)]
pub struct Registration {
    /// Newly created, inactive account.
    pub account: Account,
    /// Plaintext invitation token for out-of-band delivery.
    pub token: InvitationToken,
}

fn map_credential_error(error: CredentialError) -> Error {
    match error {
        CredentialError::PasswordTooShort { .. } | CredentialError::PasswordTooLong { .. } => {
            Error::invalid_request(error.to_string())
        }
        CredentialError::InvalidCost { .. } | CredentialError::Hashing { .. } => {
            Error::storage(error.to_string())
        }
    }
}

/// Drives accounts through registration and activation.
#[derive(Clone)]
pub struct OnboardingService<A> {
    accounts: Arc<A>,
    clock: Arc<dyn Clock>,
    config: OnboardingConfig,
}

impl<A> OnboardingService<A> {
    /// Create a service over an account store.
    pub fn new(accounts: Arc<A>, clock: Arc<dyn Clock>, config: OnboardingConfig) -> Self {
        Self {
            accounts,
            clock,
            config,
        }
    }
}

impl<A> OnboardingService<A>
where
    A: AccountRepository,
{
    /// Register an inactive account and issue its invitation token.
    ///
    /// # Errors
    ///
    /// - [`ErrorCode::InvalidRequest`](super::ErrorCode::InvalidRequest) for
    ///   malformed input; nothing is hashed or stored.
    /// - [`ErrorCode::DuplicateEmail`](super::ErrorCode::DuplicateEmail) or
    ///   [`ErrorCode::DuplicateUsername`](super::ErrorCode::DuplicateUsername)
    ///   when the store rejects the insert; no invitation survives.
    pub async fn register(&self, request: RegistrationRequest) -> Result<Registration, Error> {
        let RegistrationRequest {
            username,
            email,
            password,
        } = request;
        let username = Username::new(username)?;
        let email = Email::new(email)?;
        let password = Password::new(password).map_err(map_credential_error)?;

        let cost = self.config.password_cost;
        let password_hash = tokio::task::spawn_blocking(move || password.hash(cost))
            .await
            .map_err(|err| Error::storage(format!("password hashing task failed: {err}")))?
            .map_err(map_credential_error)?;

        let token = InvitationToken::generate();
        let invitation = PendingInvitation {
            digest: token.digest(),
            expires_at: self.clock.utc() + self.config.invitation_ttl,
        };
        let new_account = NewAccount {
            username,
            email,
            password_hash,
            role_name: self.config.default_role.clone(),
        };

        let account = self
            .accounts
            .create_with_invitation(&new_account, &invitation)
            .await
            .map_err(map_account_repository_error)?;
        debug!(account_id = %account.id, "registered account");
        Ok(Registration { account, token })
    }

    /// Redeem an invitation token and activate its account.
    ///
    /// Unknown, expired and already-consumed tokens are indistinguishable and
    /// all yield [`ErrorCode::NotFound`](super::ErrorCode::NotFound) with no
    /// state change.
    pub async fn activate(&self, token: &str) -> Result<AccountId, Error> {
        let token = InvitationToken::from_plaintext(token);
        let activated = self
            .accounts
            .activate(&token.digest(), self.clock.utc())
            .await
            .map_err(map_account_repository_error)?;
        let account_id =
            activated.ok_or_else(|| Error::not_found("invitation not found or expired"))?;
        debug!(%account_id, "activated account");
        Ok(account_id)
    }

    /// Remove an account together with any outstanding invitation.
    ///
    /// A cached copy is left to expire on its own.
    pub async fn delete_account(&self, id: AccountId) -> Result<(), Error> {
        let deleted = self
            .accounts
            .delete(id)
            .await
            .map_err(map_account_repository_error)?;
        if deleted {
            Ok(())
        } else {
            Err(Error::not_found(format!("account {id} not found")))
        }
    }
}

#[cfg(test)]
#[path = "onboarding_tests.rs"]
mod tests;
