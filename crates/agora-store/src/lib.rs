//! # Projection Store
//!
//! The relational projection of application state: users, arena rounds,
//! topics, entries, marketplace requests and proposals, escrow deals, and
//! direct deals.
//!
//! ## Design
//!
//! - `ports/` defines the [`ProjectionStore`] trait the reconciliation
//!   services write through, including the atomic operations the
//!   concurrency model leans on (find-or-create user, tally increment,
//!   two-row proposal accept).
//! - `adapters/memory` backs tests and development with a single-lock
//!   table set.
//! - `adapters/sqlite` is the durable backend; the unique index on
//!   `users.address` is what makes identity auto-provisioning race-safe.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::memory::InMemoryStore;
pub use adapters::sqlite::SqliteStore;
pub use domain::errors::StoreError;
pub use ports::{
    DirectFilter, NewArenaEntry, NewDirectRequest, NewEscrowDeal, NewProposal, NewRound,
    NewTaskRequest, NewTopic, ProjectionStore,
};
