//! In-memory adapters for every storage capability.
//!
//! All repositories handed out by one [`InMemoryDatabase`] share a single set
//! of tables behind one lock. Each operation takes the lock once and either
//! applies every change or none, which mirrors the transactional behaviour of
//! the Diesel adapters closely enough for behaviour tests.

mod accounts;
mod clock;
mod comments;
mod followers;
mod posts;
mod roles;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use parking_lot::Mutex;

use crate::domain::{Account, AccountId, Email, Post, Role, TokenDigest, Username};

pub use self::accounts::InMemoryAccountRepository;
pub use self::clock::ManualClock;
pub use self::comments::InMemoryCommentRepository;
pub use self::followers::InMemoryFollowerRepository;
pub use self::posts::InMemoryPostRepository;
pub use self::roles::InMemoryRoleRepository;

#[derive(Debug, Clone)]
struct AccountRow {
    username: Username,
    email: Email,
    password_hash: String,
    is_active: bool,
    role_id: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct InvitationRow {
    digest: TokenDigest,
    account_id: i64,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: i64,
    content: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Tables {
    roles: Vec<Role>,
    accounts: BTreeMap<i64, AccountRow>,
    invitations: Vec<InvitationRow>,
    posts: BTreeMap<i64, Post>,
    comments: Vec<CommentRow>,
    followers: BTreeSet<(i64, i64)>,
    next_account_id: i64,
    next_post_id: i64,
    next_comment_id: i64,
}

impl Tables {
    fn seeded() -> Self {
        let role = |id: i64, name: &str, description: &str| Role {
            id,
            name: name.to_owned(),
            description: description.to_owned(),
            level: id,
        };
        Self {
            roles: vec![
                role(1, "user", "A user can create posts and comments"),
                role(2, "moderator", "A moderator can update other users' posts"),
                role(3, "admin", "An admin can update and delete other users' posts"),
            ],
            accounts: BTreeMap::new(),
            invitations: Vec::new(),
            posts: BTreeMap::new(),
            comments: Vec::new(),
            followers: BTreeSet::new(),
            next_account_id: 1,
            next_post_id: 1,
            next_comment_id: 1,
        }
    }

    fn role(&self, id: i64) -> Option<&Role> {
        self.roles.iter().find(|role| role.id == id)
    }

    fn account(&self, id: i64) -> Option<Account> {
        let row = self.accounts.get(&id)?;
        let role = self.role(row.role_id)?.clone();
        Some(Account {
            id: AccountId::new(id),
            username: row.username.clone(),
            email: row.email.clone(),
            is_active: row.is_active,
            role,
            created_at: row.created_at,
        })
    }

    fn username(&self, id: i64) -> Option<Username> {
        self.accounts.get(&id).map(|row| row.username.clone())
    }

    fn remove_account(&mut self, id: i64) -> bool {
        if self.accounts.remove(&id).is_none() {
            return false;
        }
        self.invitations.retain(|row| row.account_id != id);
        self.followers
            .retain(|(follower, followed)| *follower != id && *followed != id);
        let owned: BTreeSet<i64> = self
            .posts
            .iter()
            .filter(|(_, post)| post.owner_id.get() == id)
            .map(|(post_id, _)| *post_id)
            .collect();
        self.posts.retain(|post_id, _| !owned.contains(post_id));
        self.comments
            .retain(|row| row.author_id != id && !owned.contains(&row.post_id));
        true
    }
}

/// Shared in-memory tables plus the clock used for store-assigned
/// timestamps.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use mockable::DefaultClock;
/// use social_backend::outbound::memory::InMemoryDatabase;
///
/// let db = InMemoryDatabase::new(Arc::new(DefaultClock));
/// let _accounts = db.accounts();
/// let _posts = db.posts();
/// ```
#[derive(Clone)]
pub struct InMemoryDatabase {
    tables: Arc<Mutex<Tables>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryDatabase {
    /// Create an empty database with the standard roles seeded.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::seeded())),
            clock,
        }
    }

    /// Account store over these tables.
    pub fn accounts(&self) -> InMemoryAccountRepository {
        InMemoryAccountRepository::new(self.clone())
    }

    /// Role store over these tables.
    pub fn roles(&self) -> InMemoryRoleRepository {
        InMemoryRoleRepository::new(self.clone())
    }

    /// Post store over these tables.
    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository::new(self.clone())
    }

    /// Comment store over these tables.
    pub fn comments(&self) -> InMemoryCommentRepository {
        InMemoryCommentRepository::new(self.clone())
    }

    /// Follow graph over these tables.
    pub fn followers(&self) -> InMemoryFollowerRepository {
        InMemoryFollowerRepository::new(self.clone())
    }

    /// Number of invitation rows currently stored, live or expired.
    pub fn invitation_count(&self) -> usize {
        self.tables.lock().invitations.len()
    }

    /// Number of account rows currently stored.
    pub fn account_count(&self) -> usize {
        self.tables.lock().accounts.len()
    }

    /// Stored PHC string for an account, if it exists.
    pub fn password_hash_of(&self, id: AccountId) -> Option<String> {
        self.tables
            .lock()
            .accounts
            .get(&id.get())
            .map(|row| row.password_hash.clone())
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }
}
