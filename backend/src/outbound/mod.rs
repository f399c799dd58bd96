//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **cache**: account cache adapters (Redis, in process, disabled)
//! - **rate_limit**: Redis-backed shared fixed-window limiter
//! - **memory**: in-memory repositories sharing one set of tables
//! - **redis_pool**: pooled Redis connections used by cache and limiter
//! - **config**: picks the cache and limiter adapters from configuration
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod cache;
pub mod config;
pub mod memory;
pub mod persistence;
pub mod rate_limit;
pub mod redis_pool;
