//! # Agora Shared Types
//!
//! Domain entities and vocabularies shared across the Agora subsystems.
//! This crate is the single source of truth for row shapes, the wallet
//! address newtype, and the status state machines enforced by the
//! reconciliation services.
//!
//! ## Clusters
//!
//! - **Identity**: [`WalletAddress`], [`User`], [`UserRole`]
//! - **Arena**: [`Round`], [`Topic`], [`ArenaEntry`]
//! - **Marketplace**: [`TaskRequest`], [`Proposal`]
//! - **Settlement**: [`EscrowDeal`], [`DirectRequest`]

pub mod address;
pub mod entities;
pub mod status;

pub use address::{AddressError, WalletAddress};
pub use entities::{
    ArenaEntry, DirectRequest, EscrowDeal, Proposal, Round, RowId, TaskRequest, Topic, User,
};
pub use status::{
    DirectStatus, EscrowStatus, ProposalStatus, RoundStatus, TaskRequestStatus, UserRole,
};
