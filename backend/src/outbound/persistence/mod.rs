//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL through `diesel-async` and `bb8` pooling.
//!
//! - **Thin adapters**: repositories translate between Diesel rows and domain
//!   types. No business rules live here.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Bounded calls**: every store call, pool checkout included, runs under
//!   the pool's query deadline.
//! - **Structured errors**: Diesel failures are classified by error kind and
//!   constraint name, then mapped to the port's error enum.
//!
//! # Example
//!
//! ```no_run
//! use social_backend::outbound::persistence::{DbPool, DieselAccountRepository, PoolConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/social")).await?;
//! let accounts = DieselAccountRepository::new(pool);
//! # let _ = accounts;
//! # Ok(())
//! # }
//! ```

mod diesel_account_repository;
mod diesel_comment_repository;
mod diesel_follower_repository;
pub(crate) mod diesel_helpers;
mod diesel_post_repository;
mod diesel_role_repository;
pub mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_account_repository::DieselAccountRepository;
pub use diesel_comment_repository::DieselCommentRepository;
pub use diesel_follower_repository::DieselFollowerRepository;
pub use diesel_post_repository::DieselPostRepository;
pub use diesel_role_repository::DieselRoleRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DEFAULT_QUERY_TIMEOUT, DbPool, PoolConfig, PoolError};
