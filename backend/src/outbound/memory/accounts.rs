//! In-memory account store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{AccountRepository, AccountRepositoryError, PendingInvitation};
use crate::domain::{Account, AccountId, Email, NewAccount, TokenDigest};

use super::{AccountRow, InMemoryDatabase, InvitationRow};

/// [`AccountRepository`] over [`InMemoryDatabase`] tables.
#[derive(Clone)]
pub struct InMemoryAccountRepository {
    db: InMemoryDatabase,
}

impl InMemoryAccountRepository {
    pub(super) fn new(db: InMemoryDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create_with_invitation(
        &self,
        account: &NewAccount,
        invitation: &PendingInvitation,
    ) -> Result<Account, AccountRepositoryError> {
        let now = self.db.now();
        let mut tables = self.db.tables.lock();

        if tables.accounts.values().any(|row| row.email == account.email) {
            return Err(AccountRepositoryError::duplicate_email());
        }
        if tables
            .accounts
            .values()
            .any(|row| row.username == account.username)
        {
            return Err(AccountRepositoryError::duplicate_username());
        }
        let role_id = tables
            .roles
            .iter()
            .find(|role| role.name == account.role_name)
            .map(|role| role.id)
            .ok_or_else(|| AccountRepositoryError::unknown_role(account.role_name.as_str()))?;

        let id = tables.next_account_id;
        tables.next_account_id += 1;
        tables.accounts.insert(
            id,
            AccountRow {
                username: account.username.clone(),
                email: account.email.clone(),
                password_hash: account.password_hash.as_str().to_owned(),
                is_active: false,
                role_id,
                created_at: now,
            },
        );
        tables.invitations.push(InvitationRow {
            digest: invitation.digest.clone(),
            account_id: id,
            expires_at: invitation.expires_at,
        });

        tables
            .account(id)
            .ok_or_else(|| AccountRepositoryError::query("inserted account vanished"))
    }

    async fn activate(
        &self,
        digest: &TokenDigest,
        now: DateTime<Utc>,
    ) -> Result<Option<AccountId>, AccountRepositoryError> {
        let mut tables = self.db.tables.lock();
        let Some(account_id) = tables
            .invitations
            .iter()
            .find(|row| row.digest == *digest && row.expires_at > now)
            .map(|row| row.account_id)
        else {
            return Ok(None);
        };
        let Some(row) = tables.accounts.get_mut(&account_id) else {
            return Ok(None);
        };
        row.is_active = true;
        tables.invitations.retain(|row| row.account_id != account_id);
        Ok(Some(AccountId::new(account_id)))
    }

    async fn delete(&self, id: AccountId) -> Result<bool, AccountRepositoryError> {
        Ok(self.db.tables.lock().remove_account(id.get()))
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountRepositoryError> {
        Ok(self.db.tables.lock().account(id.get()))
    }

    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let tables = self.db.tables.lock();
        let id = tables
            .accounts
            .iter()
            .find(|(_, row)| row.email == *email)
            .map(|(id, _)| *id);
        Ok(id.and_then(|id| tables.account(id)))
    }
}
