//! Read-only port for role lookups.
use async_trait::async_trait;

use crate::domain::Role;

use super::define_port_error;

define_port_error! {
    /// Errors raised by role repository adapters.
    pub enum RoleRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "role repository connection failed: {message}",
        /// The call did not complete before its deadline.
        Timeout { operation: String } => "role repository call timed out: {operation}",
        /// Query failed during execution.
        Query { message: String } => "role repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Fetch a role by its unique name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, RoleRepositoryError>;
}
