//! In-memory role lookups over the seeded role table.

use async_trait::async_trait;

use crate::domain::Role;
use crate::domain::ports::{RoleRepository, RoleRepositoryError};

use super::InMemoryDatabase;

/// [`RoleRepository`] over [`InMemoryDatabase`] tables.
#[derive(Clone)]
pub struct InMemoryRoleRepository {
    db: InMemoryDatabase,
}

impl InMemoryRoleRepository {
    pub(super) fn new(db: InMemoryDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, RoleRepositoryError> {
        Ok(self
            .db
            .tables
            .lock()
            .roles
            .iter()
            .find(|role| role.name == name)
            .cloned())
    }
}
