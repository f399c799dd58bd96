//! Secrets handled during onboarding: passwords and invitation tokens.
//!
//! Plaintext values live inside [`Zeroizing`] buffers and are wiped when
//! dropped. Only the Argon2id PHC string and the SHA-256 token digest are ever
//! handed to the persistence layer.

use std::fmt;

use argon2::password_hash::{
    PasswordHash as PhcString, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Minimum accepted password length in characters.
pub const PASSWORD_MIN: usize = 6;
/// Maximum accepted password length in characters.
pub const PASSWORD_MAX: usize = 72;

const TOKEN_BYTES: usize = 32;
const SALT_BYTES: usize = 16;

/// Errors raised while validating or hashing credentials.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// Password shorter than [`PASSWORD_MIN`].
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum accepted length.
        min: usize,
    },
    /// Password longer than [`PASSWORD_MAX`].
    #[error("password must be at most {max} characters")]
    PasswordTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// Argon2 cost parameters were rejected.
    #[error("invalid password hash cost: {message}")]
    InvalidCost {
        /// Underlying reason.
        message: String,
    },
    /// Hashing or verification failed for a reason other than a mismatch.
    #[error("password hashing failed: {message}")]
    Hashing {
        /// Underlying reason.
        message: String,
    },
}

/// Argon2id cost parameters.
///
/// Defaults follow the `argon2` crate's recommended parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordHashCost {
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
}

impl PasswordHashCost {
    /// Construct a cost from explicit parameters.
    pub const fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }

    /// Memory cost in KiB.
    pub const fn memory_kib(&self) -> u32 {
        self.memory_kib
    }

    /// Number of passes.
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Degree of parallelism.
    pub const fn parallelism(&self) -> u32 {
        self.parallelism
    }

    fn hasher(&self) -> Result<Argon2<'static>, CredentialError> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|err| CredentialError::InvalidCost {
                message: err.to_string(),
            })?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for PasswordHashCost {
    fn default() -> Self {
        Self::new(
            Params::DEFAULT_M_COST,
            Params::DEFAULT_T_COST,
            Params::DEFAULT_P_COST,
        )
    }
}

/// Plaintext password supplied at registration.
#[derive(Clone)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Validate the length bounds and take ownership of the plaintext.
    pub fn new(value: impl Into<String>) -> Result<Self, CredentialError> {
        let value = Zeroizing::new(value.into());
        let length = value.chars().count();
        if length < PASSWORD_MIN {
            return Err(CredentialError::PasswordTooShort { min: PASSWORD_MIN });
        }
        if length > PASSWORD_MAX {
            return Err(CredentialError::PasswordTooLong { max: PASSWORD_MAX });
        }
        Ok(Self(value))
    }

    /// Hash the password with a fresh salt, consuming the plaintext.
    pub fn hash(self, cost: PasswordHashCost) -> Result<PasswordHash, CredentialError> {
        let mut salt_bytes = [0_u8; SALT_BYTES];
        OsRng.fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|err| CredentialError::Hashing {
            message: err.to_string(),
        })?;
        let phc = cost
            .hasher()?
            .hash_password(self.0.as_bytes(), &salt)
            .map_err(|err| CredentialError::Hashing {
                message: err.to_string(),
            })?;
        Ok(PasswordHash(phc.to_string()))
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Argon2id PHC string; the only persisted form of a password.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a PHC string loaded from storage.
    pub fn from_phc(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the PHC string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Check a candidate plaintext against this hash.
    ///
    /// Cost parameters are read from the PHC string, so hashes produced under
    /// an older cost keep verifying.
    pub fn verify(&self, candidate: &str) -> Result<bool, CredentialError> {
        let parsed = PhcString::new(self.as_str()).map_err(|err| CredentialError::Hashing {
            message: err.to_string(),
        })?;
        match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(CredentialError::Hashing {
                message: err.to_string(),
            }),
        }
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Plaintext invitation token, revealed to the registrant exactly once.
#[derive(Clone)]
pub struct InvitationToken(Zeroizing<String>);

impl InvitationToken {
    /// Draw a new token from the operating system CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0_u8; TOKEN_BYTES]);
        OsRng.fill_bytes(&mut *bytes);
        Self(Zeroizing::new(hex::encode(&*bytes)))
    }

    /// Wrap a token presented by a caller for activation.
    pub fn from_plaintext(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Reveal the plaintext.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// SHA-256 digest used as the lookup key in storage.
    pub fn digest(&self) -> TokenDigest {
        TokenDigest(hex::encode(Sha256::digest(self.0.as_bytes())))
    }
}

impl fmt::Debug for InvitationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InvitationToken(<redacted>)")
    }
}

/// Lower-case hex SHA-256 digest of an invitation token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenDigest(String);

impl TokenDigest {
    /// Wrap a digest loaded from storage.
    pub fn from_hex(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the hex digest.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}
