//! Shared wiring for behaviour tests over the in-memory adapters, plus the
//! embedded PostgreSQL harness used by the Diesel repository suites.
#![allow(dead_code, reason = "each test binary uses a different subset")]

pub mod embedded_postgres;

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use social_backend::domain::{
    Account, AccountService, NewPost, OnboardingConfig, OnboardingService, PasswordHashCost,
    Post, PostService, RegistrationRequest,
};
use social_backend::outbound::cache::InMemoryAccountCache;
use social_backend::outbound::memory::{
    InMemoryAccountRepository, InMemoryCommentRepository, InMemoryDatabase,
    InMemoryFollowerRepository, InMemoryPostRepository, InMemoryRoleRepository, ManualClock,
};

/// Start of every test timeline.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Services wired over one in-memory database and a manual clock.
pub struct World {
    pub db: InMemoryDatabase,
    pub clock: Arc<ManualClock>,
    pub cache: Arc<InMemoryAccountCache>,
    pub onboarding: OnboardingService<InMemoryAccountRepository>,
    pub accounts:
        AccountService<InMemoryAccountRepository, InMemoryAccountCache, InMemoryFollowerRepository>,
    pub posts: PostService<InMemoryPostRepository, InMemoryCommentRepository, InMemoryRoleRepository>,
}

impl World {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(start()));
        let db = InMemoryDatabase::new(clock.clone());
        let account_repo = Arc::new(db.accounts());
        let cache = Arc::new(InMemoryAccountCache::new(
            std::time::Duration::from_secs(60),
            clock.clone(),
        ));
        // Cheap Argon2 parameters keep the suite fast.
        let config = OnboardingConfig::default().with_password_cost(PasswordHashCost::new(8, 1, 1));
        Self {
            onboarding: OnboardingService::new(account_repo.clone(), clock.clone(), config),
            accounts: AccountService::new(account_repo, cache.clone(), Arc::new(db.followers())),
            posts: PostService::new(
                Arc::new(db.posts()),
                Arc::new(db.comments()),
                Arc::new(db.roles()),
            ),
            cache,
            clock,
            db,
        }
    }

    /// Register and activate `name`, returning the active account.
    pub async fn active_account(&self, name: &str) -> Account {
        let registration = self
            .onboarding
            .register(request(name))
            .await
            .expect("registration succeeds");
        let id = self
            .onboarding
            .activate(registration.token.expose())
            .await
            .expect("activation succeeds");
        self.accounts.get_by_id(id).await.expect("account readable")
    }

    /// Create a post owned by `owner`.
    pub async fn post(&self, owner: &Account, title: &str) -> Post {
        let post = NewPost::new(owner.id, title, "body text", Vec::<String>::new())
            .expect("valid post");
        self.posts.create(&post).await.expect("post created")
    }
}

/// Registration input for `name` with a valid password.
pub fn request(name: &str) -> RegistrationRequest {
    RegistrationRequest {
        username: name.to_owned(),
        email: format!("{name}@example.com"),
        password: "correct horse".to_owned(),
    }
}
