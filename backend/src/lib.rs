//! Consistency and admission-control core for a social network backend.
//!
//! The crate is laid out hexagonally:
//!
//! - [`domain`] holds the entities, the services that enforce the account
//!   onboarding state machine, optimistic post versioning, cache-aside reads
//!   and fixed-window admission, plus the port traits they depend on.
//! - [`outbound`] provides adapters for those ports: Diesel repositories,
//!   Redis-backed cache and limiter, and in-memory doubles for tests and
//!   single-process deployments.
//! - [`settings`] loads configuration through OrthoConfig.

pub mod domain;
pub mod outbound;
pub mod settings;
