//! # Action Payloads
//!
//! One closed tagged union per domain, discriminated by the `action` field.
//! Each variant carries exactly the fields it needs, so unknown actions and
//! missing fields fail at deserialization instead of deep inside a handler.
//!
//! Addresses travel as plain strings and are parsed (and normalized) by the
//! services; ids are strings for projection rows and numbers for ledger
//! objects.

use agora_types::{DirectStatus, EscrowStatus, RoundStatus};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Arena domain actions.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ArenaAction {
    /// Create a projection round for a confirmed ledger round.
    #[serde(rename_all = "camelCase")]
    CreateRound {
        ledger_round_id: u64,
        creator_address: Option<String>,
    },

    /// Move a round's projection status to where the ledger already is.
    #[serde(rename_all = "camelCase")]
    AdvanceRound {
        round_id: String,
        target_status: RoundStatus,
    },

    /// Record a topic proposal, cross-checking the on-chain proposer.
    #[serde(rename_all = "camelCase")]
    ProposeTopic {
        round_id: String,
        proposer_address: String,
        title: String,
        description: String,
        ledger_topic_id: Option<u64>,
    },

    /// Sync a confirmed on-chain vote into the projection tally.
    #[serde(rename_all = "camelCase")]
    VoteForTopic {
        topic_id: String,
        voter_address: String,
    },

    /// Record a competition entry.
    #[serde(rename_all = "camelCase")]
    SubmitEntry {
        round_id: String,
        submitter_address: String,
        repository_url: String,
        description: String,
        demo_url: Option<String>,
        ledger_entry_id: Option<u64>,
    },

    /// Complete a round once the ledger reports a winner.
    #[serde(rename_all = "camelCase")]
    SelectWinner {
        round_id: String,
        /// Off-ledger rounds name the winner directly; ledger-backed rounds
        /// take the winner from the contract and ignore this field.
        winner_address: Option<String>,
    },
}

/// Escrow domain actions.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum EscrowAction {
    /// Create an escrow deal, optionally anchored to a ledger deal.
    ///
    /// With a ledger deal id, the requester side must match the ledger's
    /// client address — or be omitted, in which case it is adopted from the
    /// ledger. Callers who only know the deal id supply nothing else.
    #[serde(rename_all = "camelCase")]
    CreateEscrow {
        ledger_deal_id: Option<u64>,
        requester_address: Option<String>,
        worker_address: Option<String>,
        request_id: Option<String>,
        amount: Option<u64>,
    },

    /// Drive the deal's status to where the ledger already is.
    #[serde(rename_all = "camelCase")]
    UpdateStatus {
        deal_id: String,
        target_status: EscrowStatus,
    },
}

/// Marketplace task-request actions.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum TaskRequestAction {
    #[serde(rename_all = "camelCase")]
    CreateRequest {
        requester_address: String,
        title: String,
        description: String,
        budget: u64,
        deadline: DateTime<Utc>,
    },

    /// Requester-only, and only while the request is still open.
    #[serde(rename_all = "camelCase")]
    CancelRequest {
        request_id: String,
        requester_address: String,
    },
}

/// Marketplace proposal actions.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ProposalAction {
    #[serde(rename_all = "camelCase")]
    CreateProposal {
        request_id: String,
        bidder_address: String,
        price: u64,
        estimated_days: u32,
        message: String,
    },

    /// Only the parent request's requester may accept. Accepting also moves
    /// the request to in_progress and assigns the worker.
    #[serde(rename_all = "camelCase")]
    AcceptProposal {
        proposal_id: String,
        caller_address: String,
    },

    #[serde(rename_all = "camelCase")]
    RejectProposal {
        proposal_id: String,
        caller_address: String,
    },
}

/// Direct (peer-to-peer) deal actions.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum DirectAction {
    #[serde(rename_all = "camelCase")]
    CreateDeal {
        client_address: String,
        agent_address: String,
        amount: u64,
        description: String,
        deadline: DateTime<Utc>,
        ledger_deal_id: Option<u64>,
    },

    /// Agent-only, and only while pending.
    #[serde(rename_all = "camelCase")]
    AcceptDeal {
        deal_id: String,
        agent_address: String,
    },

    /// Agent-only, and only while pending.
    #[serde(rename_all = "camelCase")]
    RejectDeal {
        deal_id: String,
        agent_address: String,
    },

    /// Drive the accepted path (escrow_created → funded → completed →
    /// released) or expire a past-deadline pending deal.
    #[serde(rename_all = "camelCase")]
    UpdateStatus {
        deal_id: String,
        target_status: DirectStatus,
    },
}
