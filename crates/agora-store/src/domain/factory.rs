//! # Row Factory
//!
//! Shared row construction for all adapters: id generation, timestamps,
//! and the defaults new rows start from. Keeping this in one place means
//! the memory and SQLite adapters cannot drift on what a fresh row looks
//! like.

use agora_types::{
    ArenaEntry, DirectRequest, DirectStatus, EscrowDeal, EscrowStatus, Proposal, ProposalStatus,
    Round, RoundStatus, RowId, TaskRequest, TaskRequestStatus, Topic, User, UserRole,
    WalletAddress,
};
use chrono::Utc;
use uuid::Uuid;

use crate::ports::{
    NewArenaEntry, NewDirectRequest, NewEscrowDeal, NewProposal, NewRound, NewTaskRequest,
    NewTopic,
};

pub fn new_id() -> RowId {
    Uuid::new_v4().to_string()
}

/// Minimal user row for an address seen for the first time.
pub fn build_user(address: &WalletAddress) -> User {
    User {
        id: new_id(),
        address: address.clone(),
        display_name: address.short(),
        role: UserRole::Both,
        reputation: 0,
        tasks_completed: 0,
        created_at: Utc::now(),
    }
}

pub fn build_round(new: NewRound) -> Round {
    Round {
        id: new_id(),
        sequence: new.sequence,
        prize: new.prize,
        status: RoundStatus::Proposing,
        ledger_round_id: new.ledger_round_id,
        winner_user_id: None,
        selected_topic_id: None,
        creator_address: new.creator_address,
        created_at: Utc::now(),
    }
}

pub fn build_topic(new: NewTopic) -> Topic {
    Topic {
        id: new_id(),
        round_id: new.round_id,
        proposer_user_id: new.proposer_user_id,
        title: new.title,
        description: new.description,
        votes: 0,
        ledger_topic_id: new.ledger_topic_id,
        created_at: Utc::now(),
    }
}

pub fn build_entry(new: NewArenaEntry) -> ArenaEntry {
    ArenaEntry {
        id: new_id(),
        round_id: new.round_id,
        submitter_user_id: new.submitter_user_id,
        repository_url: new.repository_url,
        description: new.description,
        demo_url: new.demo_url,
        ledger_entry_id: new.ledger_entry_id,
        created_at: Utc::now(),
    }
}

pub fn build_task_request(new: NewTaskRequest) -> TaskRequest {
    TaskRequest {
        id: new_id(),
        requester_user_id: new.requester_user_id,
        title: new.title,
        description: new.description,
        budget: new.budget,
        deadline: new.deadline,
        status: TaskRequestStatus::Open,
        assigned_worker_id: None,
        created_at: Utc::now(),
    }
}

pub fn build_proposal(new: NewProposal) -> Proposal {
    Proposal {
        id: new_id(),
        request_id: new.request_id,
        bidder_user_id: new.bidder_user_id,
        price: new.price,
        estimated_days: new.estimated_days,
        message: new.message,
        status: ProposalStatus::Pending,
        created_at: Utc::now(),
    }
}

pub fn build_escrow(new: NewEscrowDeal) -> EscrowDeal {
    EscrowDeal {
        id: new_id(),
        request_id: new.request_id,
        requester_user_id: new.requester_user_id,
        worker_user_id: new.worker_user_id,
        amount: new.amount,
        status: EscrowStatus::Created,
        ledger_deal_id: new.ledger_deal_id,
        completed_at: None,
        created_at: Utc::now(),
    }
}

pub fn build_direct(new: NewDirectRequest) -> DirectRequest {
    DirectRequest {
        id: new_id(),
        client_address: new.client_address,
        agent_address: new.agent_address,
        client_user_id: new.client_user_id,
        agent_user_id: new.agent_user_id,
        amount: new.amount,
        description: new.description,
        deadline: new.deadline,
        status: DirectStatus::Pending,
        ledger_deal_id: new.ledger_deal_id,
        created_at: Utc::now(),
    }
}
