//! PostgreSQL-backed `AccountRepository` implementation using Diesel ORM.
//!
//! Registration inserts the account and its invitation in one transaction;
//! activation locks the matching invitation row, flips the account active and
//! deletes the account's invitations in another. Uniqueness failures are
//! classified by constraint name.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{AccountRepository, AccountRepositoryError, PendingInvitation};
use crate::domain::{Account, AccountId, Email, NewAccount, TokenDigest};

use super::diesel_helpers::{
    ACCOUNTS_EMAIL_KEY, ACCOUNTS_USERNAME_KEY, StoreFailure, classify_diesel_error,
    map_pool_error_message, with_deadline,
};
use super::models::{AccountRow, NewAccountRow, NewInvitationRow, RoleRow};
use super::pool::{DbPool, PoolError};
use super::schema::{account_invitations, accounts, roles};

/// Diesel-backed implementation of the `AccountRepository` port.
#[derive(Clone)]
pub struct DieselAccountRepository {
    pool: DbPool,
}

impl DieselAccountRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AccountRepositoryError {
    AccountRepositoryError::connection(map_pool_error_message(error))
}

fn map_store_failure(failure: StoreFailure) -> AccountRepositoryError {
    if failure.violates(ACCOUNTS_EMAIL_KEY) {
        return AccountRepositoryError::duplicate_email();
    }
    if failure.violates(ACCOUNTS_USERNAME_KEY) {
        return AccountRepositoryError::duplicate_username();
    }
    match failure {
        StoreFailure::Connection(message) => AccountRepositoryError::connection(message),
        StoreFailure::Query(message) => AccountRepositoryError::query(message),
        StoreFailure::UniqueViolation { .. }
        | StoreFailure::ForeignKeyViolation { .. }
        | StoreFailure::CheckViolation { .. } => {
            AccountRepositoryError::query("account constraint violated")
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> AccountRepositoryError {
    map_store_failure(classify_diesel_error(error))
}

/// Failure inside the registration transaction.
#[derive(Debug)]
enum RegistrationTxError {
    UnknownRole,
    Diesel(diesel::result::Error),
}

impl From<diesel::result::Error> for RegistrationTxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

type AccountWithRole = (AccountRow, RoleRow);

fn into_account((row, role): AccountWithRole) -> Result<Account, AccountRepositoryError> {
    row.into_account(role).map_err(AccountRepositoryError::query)
}

#[async_trait]
impl AccountRepository for DieselAccountRepository {
    async fn create_with_invitation(
        &self,
        account: &NewAccount,
        invitation: &PendingInvitation,
    ) -> Result<Account, AccountRepositoryError> {
        let call = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let created: Result<AccountWithRole, RegistrationTxError> = conn
                .transaction(|conn| {
                    async move {
                        let role: RoleRow = roles::table
                            .filter(roles::name.eq(account.role_name.as_str()))
                            .select(RoleRow::as_select())
                            .first(conn)
                            .await
                            .optional()?
                            .ok_or(RegistrationTxError::UnknownRole)?;

                        let row: AccountRow = diesel::insert_into(accounts::table)
                            .values(&NewAccountRow {
                                username: account.username.as_str(),
                                email: account.email.as_str(),
                                password_hash: account.password_hash.as_str(),
                                is_active: false,
                                role_id: role.id,
                            })
                            .returning(AccountRow::as_returning())
                            .get_result(conn)
                            .await?;

                        diesel::insert_into(account_invitations::table)
                            .values(&NewInvitationRow {
                                token_digest: invitation.digest.as_str(),
                                account_id: row.id,
                                expires_at: invitation.expires_at,
                            })
                            .execute(conn)
                            .await?;

                        Ok((row, role))
                    }
                    .scope_boxed()
                })
                .await;
            let created = created.map_err(|error| match error {
                RegistrationTxError::UnknownRole => {
                    AccountRepositoryError::unknown_role(account.role_name.as_str())
                }
                RegistrationTxError::Diesel(error) => map_diesel_error(error),
            })?;
            into_account(created)
        };
        with_deadline(
            self.pool.query_timeout(),
            "create account with invitation",
            AccountRepositoryError::timeout,
            call,
        )
        .await
    }

    async fn activate(
        &self,
        digest: &TokenDigest,
        now: DateTime<Utc>,
    ) -> Result<Option<AccountId>, AccountRepositoryError> {
        let call = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            conn.transaction(|conn| {
                async move {
                    let owner: Option<i64> = account_invitations::table
                        .filter(account_invitations::token_digest.eq(digest.as_str()))
                        .filter(account_invitations::expires_at.gt(now))
                        .select(account_invitations::account_id)
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(account_id) = owner else {
                        return Ok(None);
                    };

                    diesel::update(accounts::table.find(account_id))
                        .set(accounts::is_active.eq(true))
                        .execute(conn)
                        .await?;
                    diesel::delete(
                        account_invitations::table
                            .filter(account_invitations::account_id.eq(account_id)),
                    )
                    .execute(conn)
                    .await?;

                    Ok(Some(AccountId::new(account_id)))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)
        };
        with_deadline(
            self.pool.query_timeout(),
            "activate account",
            AccountRepositoryError::timeout,
            call,
        )
        .await
    }

    async fn delete(&self, id: AccountId) -> Result<bool, AccountRepositoryError> {
        let call = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let removed = diesel::delete(accounts::table.find(id.get()))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            Ok::<_, AccountRepositoryError>(removed > 0)
        };
        with_deadline(
            self.pool.query_timeout(),
            "delete account",
            AccountRepositoryError::timeout,
            call,
        )
        .await
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountRepositoryError> {
        let call = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<AccountWithRole> = accounts::table
                .inner_join(roles::table)
                .filter(accounts::id.eq(id.get()))
                .select((AccountRow::as_select(), RoleRow::as_select()))
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            row.map(into_account).transpose()
        };
        with_deadline(
            self.pool.query_timeout(),
            "find account by id",
            AccountRepositoryError::timeout,
            call,
        )
        .await
    }

    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let call = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<AccountWithRole> = accounts::table
                .inner_join(roles::table)
                .filter(accounts::email.eq(email.as_str()))
                .select((AccountRow::as_select(), RoleRow::as_select()))
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            row.map(into_account).transpose()
        };
        with_deadline(
            self.pool.query_timeout(),
            "find account by email",
            AccountRepositoryError::timeout,
            call,
        )
        .await
    }
}
