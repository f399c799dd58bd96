//! PostgreSQL-backed `RoleRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::Role;
use crate::domain::ports::{RoleRepository, RoleRepositoryError};

use super::diesel_helpers::{
    StoreFailure, classify_diesel_error, map_pool_error_message, with_deadline,
};
use super::models::RoleRow;
use super::pool::{DbPool, PoolError};
use super::schema::roles;

/// Diesel-backed implementation of the `RoleRepository` port.
#[derive(Clone)]
pub struct DieselRoleRepository {
    pool: DbPool,
}

impl DieselRoleRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> RoleRepositoryError {
    RoleRepositoryError::connection(map_pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> RoleRepositoryError {
    match classify_diesel_error(error) {
        StoreFailure::Connection(message) => RoleRepositoryError::connection(message),
        StoreFailure::Query(message) => RoleRepositoryError::query(message),
        StoreFailure::UniqueViolation { .. }
        | StoreFailure::ForeignKeyViolation { .. }
        | StoreFailure::CheckViolation { .. } => {
            RoleRepositoryError::query("role constraint violated")
        }
    }
}

#[async_trait]
impl RoleRepository for DieselRoleRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, RoleRepositoryError> {
        let call = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<RoleRow> = roles::table
                .filter(roles::name.eq(name))
                .select(RoleRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            Ok::<_, RoleRepositoryError>(row.map(Role::from))
        };
        with_deadline(
            self.pool.query_timeout(),
            "find role by name",
            RoleRepositoryError::timeout,
            call,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn not_found_maps_to_query_error() {
        let error = map_diesel_error(diesel::result::Error::NotFound);
        assert!(matches!(error, RoleRepositoryError::Query { .. }));
        assert!(error.to_string().contains("record not found"));
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let error = map_pool_error(PoolError::build("invalid URL"));
        assert!(matches!(error, RoleRepositoryError::Connection { .. }));
    }
}
