//! Port for request admission control.
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::define_port_error;

/// Identity a request is counted against, typically the client address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(String);

impl ClientKey {
    /// Construct a key after validating that it is non-empty and trimmed.
    pub fn new(value: impl Into<String>) -> Result<Self, ClientKeyValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(ClientKeyValidationError::Empty);
        }
        if raw.trim() != raw {
            return Err(ClientKeyValidationError::ContainsWhitespace);
        }
        Ok(Self(raw))
    }

    /// Borrow the underlying key.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors returned when constructing [`ClientKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientKeyValidationError {
    /// Key is empty after trimming whitespace.
    #[error("client key must not be empty")]
    Empty,
    /// Key contains leading or trailing whitespace.
    #[error("client key must not contain surrounding whitespace")]
    ContainsWhitespace,
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitDecision {
    /// The request fits within the current window.
    Admitted,
    /// The window is exhausted.
    Rejected {
        /// Time until the window resets.
        retry_after: Duration,
    },
}

impl LimitDecision {
    /// Whether the request may proceed.
    pub const fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

define_port_error! {
    /// Errors surfaced by limiter backends.
    pub enum RequestLimiterError {
        /// The shared counter store failed or timed out.
        Backend { message: String } => "rate limiter backend failure: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestLimiter: Send + Sync {
    /// Count one request against `key` and decide whether to admit it.
    ///
    /// The check and the increment happen as one atomic step.
    async fn allow(&self, key: &ClientKey) -> Result<LimitDecision, RequestLimiterError>;
}

#[cfg(test)]
mod tests {
    //! Validates client key parsing.
    use super::{ClientKey, ClientKeyValidationError};
    use rstest::rstest;

    #[rstest]
    #[case("", ClientKeyValidationError::Empty)]
    #[case("   ", ClientKeyValidationError::Empty)]
    #[case(" 10.0.0.1", ClientKeyValidationError::ContainsWhitespace)]
    fn client_key_rejects_invalid(#[case] raw: &str, #[case] expected: ClientKeyValidationError) {
        assert_eq!(ClientKey::new(raw), Err(expected));
    }

    #[rstest]
    fn client_key_accepts_address() {
        let key = ClientKey::new("10.0.0.1").expect("valid key");
        assert_eq!(key.as_str(), "10.0.0.1");
        assert_eq!(key.to_string(), "10.0.0.1");
    }
}
