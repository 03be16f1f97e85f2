//! # Reconciliation Layer
//!
//! The one subsystem with real invariants: request handlers that mutate the
//! relational projection only after validating the mutation against the
//! authoritative on-chain ledger.
//!
//! ## Control flow
//!
//! ```text
//! caller → action enum (exhaustive dispatch)
//!        → IdentityResolver (resolve/create actor)
//!        → LedgerReader     (optional cross-check)
//!        → validator rules  (accept/reject)
//!        → ProjectionStore  (commit)
//!        → response mirrors the committed row
//! ```
//!
//! Rows carrying a ledger id are ledger-backed: every status transition is
//! confirmed against a fresh ledger read first. Rows without one are pure
//! off-ledger and skip the check — both modes share one code path.
//!
//! Handlers are stateless, short-lived, and catch nothing. No retries, no
//! silent repairs: every inconsistency surfaces to the caller, who is
//! expected to re-read the ledger and resubmit.

pub mod actions;
pub mod errors;
pub mod identity;
pub mod services;

pub use actions::{ArenaAction, DirectAction, EscrowAction, ProposalAction, TaskRequestAction};
pub use errors::ReconcileError;
pub use identity::IdentityResolver;
pub use services::arena::ArenaService;
pub use services::direct::DirectDealService;
pub use services::escrow::EscrowService;
pub use services::marketplace::MarketplaceService;
