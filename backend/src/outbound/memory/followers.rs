//! In-memory follow graph.

use async_trait::async_trait;

use crate::domain::AccountId;
use crate::domain::ports::{FollowerRepository, FollowerRepositoryError};

use super::InMemoryDatabase;

/// [`FollowerRepository`] over [`InMemoryDatabase`] tables.
#[derive(Clone)]
pub struct InMemoryFollowerRepository {
    db: InMemoryDatabase,
}

impl InMemoryFollowerRepository {
    pub(super) fn new(db: InMemoryDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FollowerRepository for InMemoryFollowerRepository {
    async fn follow(
        &self,
        follower: AccountId,
        followed: AccountId,
    ) -> Result<(), FollowerRepositoryError> {
        if follower == followed {
            return Err(FollowerRepositoryError::self_follow());
        }
        let mut tables = self.db.tables.lock();
        if !tables.accounts.contains_key(&follower.get())
            || !tables.accounts.contains_key(&followed.get())
        {
            return Err(FollowerRepositoryError::unknown_account());
        }
        if tables.followers.insert((follower.get(), followed.get())) {
            Ok(())
        } else {
            Err(FollowerRepositoryError::already_following())
        }
    }

    async fn unfollow(
        &self,
        follower: AccountId,
        followed: AccountId,
    ) -> Result<bool, FollowerRepositoryError> {
        Ok(self
            .db
            .tables
            .lock()
            .followers
            .remove(&(follower.get(), followed.get())))
    }
}

#[cfg(test)]
mod tests {
    //! Constraint enforcement on the follow graph.
    use std::sync::Arc;

    use chrono::{TimeDelta, TimeZone, Utc};
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::{AccountRepository, PendingInvitation};
    use crate::domain::{Email, InvitationToken, NewAccount, PasswordHash, Username};
    use crate::outbound::memory::{InMemoryDatabase, ManualClock};

    async fn seeded() -> (InMemoryDatabase, AccountId, AccountId) {
        let now = Utc
            .with_ymd_and_hms(2026, 4, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp");
        let db = InMemoryDatabase::new(Arc::new(ManualClock::new(now)));
        let mut ids = Vec::new();
        for name in ["alice", "bob"] {
            let account = NewAccount {
                username: Username::new(name).expect("username"),
                email: Email::new(format!("{name}@x.com")).expect("email"),
                password_hash: PasswordHash::from_phc("$argon2id$stub"),
                role_name: "user".to_owned(),
            };
            let invitation = PendingInvitation {
                digest: InvitationToken::generate().digest(),
                expires_at: now + TimeDelta::days(3),
            };
            let created = db
                .accounts()
                .create_with_invitation(&account, &invitation)
                .await
                .expect("account");
            ids.push(created.id);
        }
        (db, ids[0], ids[1])
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_edge_is_rejected() {
        let (db, alice, bob) = seeded().await;
        let graph = db.followers();
        graph.follow(alice, bob).await.expect("first follow");
        let error = graph.follow(alice, bob).await.expect_err("duplicate");
        assert_eq!(error, FollowerRepositoryError::AlreadyFollowing);
        graph.follow(bob, alice).await.expect("reverse edge is distinct");
    }

    #[rstest]
    #[case(AccountId::new(1), AccountId::new(1), FollowerRepositoryError::SelfFollow)]
    #[case(AccountId::new(1), AccountId::new(99), FollowerRepositoryError::UnknownAccount)]
    #[tokio::test]
    async fn invalid_edges_are_rejected(
        #[case] follower: AccountId,
        #[case] followed: AccountId,
        #[case] expected: FollowerRepositoryError,
    ) {
        let (db, _, _) = seeded().await;
        let error = db
            .followers()
            .follow(follower, followed)
            .await
            .expect_err("invalid edge");
        assert_eq!(error, expected);
    }

    #[rstest]
    #[tokio::test]
    async fn unfollow_reports_whether_an_edge_existed() {
        let (db, alice, bob) = seeded().await;
        let graph = db.followers();
        graph.follow(alice, bob).await.expect("follow");
        assert!(graph.unfollow(alice, bob).await.expect("unfollow"));
        assert!(!graph.unfollow(alice, bob).await.expect("unfollow"));
    }
}
