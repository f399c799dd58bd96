//! Account data model.
//!
//! Accounts are identified by an opaque integer id assigned by the store.
//! The password hash never appears on [`Account`]; it only travels inward on
//! [`NewAccount`] so cached and serialised copies cannot leak it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::credentials::PasswordHash;

/// Validation errors returned by the account value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountValidationError {
    /// Username is blank.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Username is shorter than the minimum.
    #[error("username must be at least {min} characters")]
    UsernameTooShort {
        /// Minimum accepted length.
        min: usize,
    },
    /// Username is longer than the maximum.
    #[error("username must be at most {max} characters")]
    UsernameTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// Email is blank.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Email does not look like an address.
    #[error("email must contain a local part and a domain")]
    MalformedEmail,
    /// Email is longer than the maximum.
    #[error("email must be at most {max} characters")]
    EmailTooLong {
        /// Maximum accepted length.
        max: usize,
    },
}

impl From<AccountValidationError> for super::Error {
    fn from(value: AccountValidationError) -> Self {
        Self::invalid_request(value.to_string())
    }
}

/// Minimum allowed username length.
pub const USERNAME_MIN: usize = 2;
/// Maximum allowed username length.
pub const USERNAME_MAX: usize = 100;
/// Maximum allowed email length.
pub const EMAIL_MAX: usize = 255;

/// Store-assigned account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i64);

impl AccountId {
    /// Wrap a raw identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Access the raw identifier.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Globally unique login handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`].
    pub fn new(value: impl Into<String>) -> Result<Self, AccountValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AccountValidationError::EmptyUsername);
        }
        let length = trimmed.chars().count();
        if length < USERNAME_MIN {
            return Err(AccountValidationError::UsernameTooShort { min: USERNAME_MIN });
        }
        if length > USERNAME_MAX {
            return Err(AccountValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the username.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = AccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Globally unique contact address, stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`].
    pub fn new(value: impl Into<String>) -> Result<Self, AccountValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AccountValidationError::EmptyEmail);
        }
        if trimmed.chars().count() > EMAIL_MAX {
            return Err(AccountValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        match trimmed.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(trimmed.to_lowercase()))
            }
            _ => Err(AccountValidationError::MalformedEmail),
        }
    }

    /// Borrow the address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = AccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Name of the role assigned to newly registered accounts.
pub const DEFAULT_ROLE: &str = "user";
/// Role allowed to edit content owned by others.
pub const MODERATOR_ROLE: &str = "moderator";
/// Role allowed to delete content owned by others.
pub const ADMIN_ROLE: &str = "admin";

/// Authorisation role with a numeric precedence level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Store identifier.
    pub id: i64,
    /// Unique role name, e.g. `user` or `admin`.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Higher levels carry more authority.
    pub level: i64,
}

impl Role {
    /// Whether this role is at least as powerful as `required`.
    ///
    /// # Examples
    /// ```
    /// use social_backend::domain::Role;
    ///
    /// let admin = Role { id: 3, name: "admin".into(), description: String::new(), level: 3 };
    /// let moderator = Role { id: 2, name: "moderator".into(), description: String::new(), level: 2 };
    /// assert!(admin.has_precedence_over(&moderator));
    /// assert!(!moderator.has_precedence_over(&admin));
    /// ```
    pub fn has_precedence_over(&self, required: &Self) -> bool {
        self.level >= required.level
    }
}

/// Persisted account record as seen by callers and the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Store-assigned identifier.
    pub id: AccountId,
    /// Unique login handle.
    pub username: Username,
    /// Unique contact address.
    pub email: Email,
    /// Set exactly once by a successful activation.
    pub is_active: bool,
    /// Assigned role.
    pub role: Role,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert payload for registration.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Requested username.
    pub username: Username,
    /// Requested email.
    pub email: Email,
    /// Salted one-way password hash.
    pub password_hash: PasswordHash,
    /// Role name to resolve at insert time.
    pub role_name: String,
}

#[cfg(test)]
mod tests {
    //! Validation coverage for account value types.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", AccountValidationError::EmptyUsername)]
    #[case("   ", AccountValidationError::EmptyUsername)]
    #[case("a", AccountValidationError::UsernameTooShort { min: USERNAME_MIN })]
    fn username_rejects_invalid_input(#[case] raw: &str, #[case] expected: AccountValidationError) {
        assert_eq!(Username::new(raw), Err(expected));
    }

    #[rstest]
    fn username_rejects_overlong_input() {
        let raw = "x".repeat(USERNAME_MAX + 1);
        assert_eq!(
            Username::new(raw),
            Err(AccountValidationError::UsernameTooLong { max: USERNAME_MAX })
        );
    }

    #[rstest]
    fn username_trims_surrounding_whitespace() {
        let username = Username::new("  alice ").expect("valid username");
        assert_eq!(username.as_str(), "alice");
    }

    #[rstest]
    #[case("", AccountValidationError::EmptyEmail)]
    #[case("alice", AccountValidationError::MalformedEmail)]
    #[case("@x.com", AccountValidationError::MalformedEmail)]
    #[case("alice@", AccountValidationError::MalformedEmail)]
    fn email_rejects_invalid_input(#[case] raw: &str, #[case] expected: AccountValidationError) {
        assert_eq!(Email::new(raw), Err(expected));
    }

    #[rstest]
    fn email_is_normalised_to_lower_case() {
        let email = Email::new("Alice@X.com").expect("valid email");
        assert_eq!(email.as_str(), "alice@x.com");
    }

    #[rstest]
    fn username_deserialisation_validates() {
        let result: Result<Username, _> = serde_json::from_str("\"a\"");
        assert!(result.is_err());
    }

    #[rstest]
    #[case(3, 2, true)]
    #[case(2, 2, true)]
    #[case(1, 2, false)]
    fn role_precedence_compares_levels(
        #[case] actor_level: i64,
        #[case] required_level: i64,
        #[case] expected: bool,
    ) {
        let actor = Role {
            id: 1,
            name: "actor".to_owned(),
            description: String::new(),
            level: actor_level,
        };
        let required = Role {
            id: 2,
            name: "required".to_owned(),
            description: String::new(),
            level: required_level,
        };
        assert_eq!(actor.has_precedence_over(&required), expected);
    }
}
