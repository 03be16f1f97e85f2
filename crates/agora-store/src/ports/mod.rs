//! # Store Port
//!
//! The write/read surface the reconciliation services depend on. Adapters
//! must honor three atomicity promises the concurrency model leans on:
//!
//! - `find_or_create_user` is a single atomic find-or-create keyed by the
//!   normalized address (unique constraint + insert-or-fetch, never
//!   read-then-write);
//! - `increment_topic_votes` is an in-store increment, not a
//!   read-modify-write;
//! - `accept_proposal` flips the proposal and its parent request together.

use agora_types::{
    ArenaEntry, DirectRequest, DirectStatus, EscrowDeal, EscrowStatus, Proposal, ProposalStatus,
    Round, RoundStatus, RowId, TaskRequest, TaskRequestStatus, Topic, User, WalletAddress,
};
use chrono::{DateTime, Utc};

use crate::domain::errors::StoreError;

/// Input for a new arena round row.
#[derive(Debug, Clone)]
pub struct NewRound {
    pub sequence: u64,
    pub prize: u64,
    pub ledger_round_id: Option<u64>,
    pub creator_address: Option<WalletAddress>,
}

/// Input for a new topic row.
#[derive(Debug, Clone)]
pub struct NewTopic {
    pub round_id: RowId,
    pub proposer_user_id: RowId,
    pub title: String,
    pub description: String,
    pub ledger_topic_id: Option<u64>,
}

/// Input for a new arena entry row.
#[derive(Debug, Clone)]
pub struct NewArenaEntry {
    pub round_id: RowId,
    pub submitter_user_id: RowId,
    pub repository_url: String,
    pub description: String,
    pub demo_url: Option<String>,
    pub ledger_entry_id: Option<u64>,
}

/// Input for a new task request row.
#[derive(Debug, Clone)]
pub struct NewTaskRequest {
    pub requester_user_id: RowId,
    pub title: String,
    pub description: String,
    pub budget: u64,
    pub deadline: DateTime<Utc>,
}

/// Input for a new proposal row.
#[derive(Debug, Clone)]
pub struct NewProposal {
    pub request_id: RowId,
    pub bidder_user_id: RowId,
    pub price: u64,
    pub estimated_days: u32,
    pub message: String,
}

/// Input for a new escrow deal row.
#[derive(Debug, Clone)]
pub struct NewEscrowDeal {
    pub request_id: RowId,
    pub requester_user_id: RowId,
    pub worker_user_id: RowId,
    pub amount: u64,
    pub ledger_deal_id: Option<u64>,
}

/// Input for a new direct deal row.
#[derive(Debug, Clone)]
pub struct NewDirectRequest {
    pub client_address: WalletAddress,
    pub agent_address: WalletAddress,
    pub client_user_id: RowId,
    pub agent_user_id: RowId,
    pub amount: u64,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub ledger_deal_id: Option<u64>,
}

/// Filter for the direct-deal listing endpoint.
///
/// `either` matches rows where the address sits on either side; it composes
/// with the other filters as an additional AND condition.
#[derive(Debug, Clone, Default)]
pub struct DirectFilter {
    pub agent: Option<WalletAddress>,
    pub client: Option<WalletAddress>,
    pub status: Option<DirectStatus>,
    pub either: Option<WalletAddress>,
}

/// The projection store surface.
///
/// All methods take `&self`; adapters use interior mutability so one
/// instance can be shared across concurrent handlers.
pub trait ProjectionStore: Send + Sync {
    // -- users ---------------------------------------------------------------

    fn find_user_by_address(&self, address: &WalletAddress) -> Result<Option<User>, StoreError>;

    /// Atomic find-or-create by normalized address. Concurrent first-time
    /// resolution of one address must yield exactly one row.
    fn find_or_create_user(&self, address: &WalletAddress) -> Result<User, StoreError>;

    fn get_user(&self, id: &str) -> Result<User, StoreError>;

    // -- arena ---------------------------------------------------------------

    fn insert_round(&self, new: NewRound) -> Result<Round, StoreError>;
    fn get_round(&self, id: &str) -> Result<Round, StoreError>;
    fn update_round_status(&self, id: &str, status: RoundStatus) -> Result<Round, StoreError>;

    /// Mark the round completed and record its winner in one write.
    fn complete_round(&self, id: &str, winner_user_id: &str) -> Result<Round, StoreError>;

    fn insert_topic(&self, new: NewTopic) -> Result<Topic, StoreError>;
    fn get_topic(&self, id: &str) -> Result<Topic, StoreError>;

    /// Overwrite the tally with a ledger-reported total (ledger-backed sync).
    fn set_topic_votes(&self, id: &str, votes: u64) -> Result<Topic, StoreError>;

    /// In-store atomic increment (off-ledger tallies).
    fn increment_topic_votes(&self, id: &str) -> Result<Topic, StoreError>;

    fn insert_entry(&self, new: NewArenaEntry) -> Result<ArenaEntry, StoreError>;

    // -- marketplace ---------------------------------------------------------

    fn insert_task_request(&self, new: NewTaskRequest) -> Result<TaskRequest, StoreError>;
    fn get_task_request(&self, id: &str) -> Result<TaskRequest, StoreError>;
    fn update_task_request_status(
        &self,
        id: &str,
        status: TaskRequestStatus,
    ) -> Result<TaskRequest, StoreError>;

    fn insert_proposal(&self, new: NewProposal) -> Result<Proposal, StoreError>;
    fn get_proposal(&self, id: &str) -> Result<Proposal, StoreError>;
    fn set_proposal_status(&self, id: &str, status: ProposalStatus)
        -> Result<Proposal, StoreError>;

    /// Accept a proposal: proposal → accepted, parent request →
    /// in_progress with the bidder assigned. Both rows or neither.
    fn accept_proposal(&self, proposal_id: &str) -> Result<(Proposal, TaskRequest), StoreError>;

    // -- settlement ----------------------------------------------------------

    fn insert_escrow(&self, new: NewEscrowDeal) -> Result<EscrowDeal, StoreError>;
    fn get_escrow(&self, id: &str) -> Result<EscrowDeal, StoreError>;
    fn update_escrow_status(
        &self,
        id: &str,
        status: EscrowStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<EscrowDeal, StoreError>;

    fn insert_direct(&self, new: NewDirectRequest) -> Result<DirectRequest, StoreError>;
    fn get_direct(&self, id: &str) -> Result<DirectRequest, StoreError>;
    fn update_direct_status(
        &self,
        id: &str,
        status: DirectStatus,
    ) -> Result<DirectRequest, StoreError>;
    fn list_direct(&self, filter: &DirectFilter) -> Result<Vec<DirectRequest>, StoreError>;
}
