//! # Projection Entities
//!
//! Row shapes for the off-chain projection. Every row carries a generated
//! identifier and an insertion timestamp; rows with a `ledger_*_id` are
//! ledger-backed and subject to cross-checks before any status transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::WalletAddress;
use crate::status::{
    DirectStatus, EscrowStatus, ProposalStatus, RoundStatus, TaskRequestStatus, UserRole,
};

/// Generated row identifier (UUID v4, assigned by the store on insert).
pub type RowId = String;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A platform user, keyed by wallet address.
///
/// Created implicitly on first reference to an unknown address. Never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RowId,
    /// Unique, case-insensitive (stored normalized).
    pub address: WalletAddress,
    pub display_name: String,
    pub role: UserRole,
    /// Reputation score accrued from completed work.
    pub reputation: u32,
    pub tasks_completed: u32,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// CLUSTER B: ARENA
// =============================================================================

/// An Arena competition round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub id: RowId,
    /// Sequence number as reported by the ledger at creation time.
    pub sequence: u64,
    /// Prize amount in ledger-scaled units.
    pub prize: u64,
    pub status: RoundStatus,
    /// Present iff the round is ledger-backed.
    pub ledger_round_id: Option<u64>,
    pub winner_user_id: Option<RowId>,
    pub selected_topic_id: Option<RowId>,
    pub creator_address: Option<WalletAddress>,
    pub created_at: DateTime<Utc>,
}

/// A proposed topic inside a round. The vote tally is monotonically
/// non-decreasing and only moved by the vote action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: RowId,
    pub round_id: RowId,
    pub proposer_user_id: RowId,
    pub title: String,
    pub description: String,
    pub votes: u64,
    pub ledger_topic_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// A competition entry submitted into a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaEntry {
    pub id: RowId,
    pub round_id: RowId,
    pub submitter_user_id: RowId,
    pub repository_url: String,
    pub description: String,
    pub demo_url: Option<String>,
    pub ledger_entry_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// CLUSTER C: MARKETPLACE
// =============================================================================

/// An open-marketplace task request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub id: RowId,
    pub requester_user_id: RowId,
    pub title: String,
    pub description: String,
    /// Budget in ledger-scaled units.
    pub budget: u64,
    pub deadline: DateTime<Utc>,
    pub status: TaskRequestStatus,
    pub assigned_worker_id: Option<RowId>,
    pub created_at: DateTime<Utc>,
}

/// A worker's bid on a task request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: RowId,
    pub request_id: RowId,
    pub bidder_user_id: RowId,
    pub price: u64,
    pub estimated_days: u32,
    pub message: String,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// CLUSTER D: SETTLEMENT
// =============================================================================

/// An escrow deal settling a task request on-chain.
///
/// Always has a parent request; when a deal is created standalone the store
/// synthesizes a placeholder request first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscrowDeal {
    pub id: RowId,
    pub request_id: RowId,
    pub requester_user_id: RowId,
    pub worker_user_id: RowId,
    pub amount: u64,
    pub status: EscrowStatus,
    pub ledger_deal_id: Option<u64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A peer-to-peer deal bypassing the open marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectRequest {
    pub id: RowId,
    pub client_address: WalletAddress,
    pub agent_address: WalletAddress,
    pub client_user_id: RowId,
    pub agent_user_id: RowId,
    pub amount: u64,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub status: DirectStatus,
    pub ledger_deal_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}
