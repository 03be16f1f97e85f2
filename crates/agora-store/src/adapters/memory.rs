//! # In-memory Store
//!
//! Table set behind a single lock. One lock makes every port method — in
//! particular find-or-create and the two-row proposal accept — trivially
//! atomic. Production uses `SqliteStore`.

use std::collections::HashMap;

use agora_types::{
    ArenaEntry, DirectRequest, DirectStatus, EscrowDeal, EscrowStatus, Proposal, ProposalStatus,
    Round, RoundStatus, RowId, TaskRequest, TaskRequestStatus, Topic, User, WalletAddress,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::domain::errors::StoreError;
use crate::domain::factory;
use crate::ports::{
    DirectFilter, NewArenaEntry, NewDirectRequest, NewEscrowDeal, NewProposal, NewRound,
    NewTaskRequest, NewTopic, ProjectionStore,
};

#[derive(Default)]
struct Tables {
    users: HashMap<RowId, User>,
    users_by_address: HashMap<String, RowId>,
    rounds: HashMap<RowId, Round>,
    topics: HashMap<RowId, Topic>,
    entries: HashMap<RowId, ArenaEntry>,
    requests: HashMap<RowId, TaskRequest>,
    proposals: HashMap<RowId, Proposal>,
    escrows: HashMap<RowId, EscrowDeal>,
    directs: HashMap<RowId, DirectRequest>,
    /// Insertion order, newest last; listings return newest first.
    direct_order: Vec<RowId>,
}

/// In-memory [`ProjectionStore`] adapter.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectionStore for InMemoryStore {
    fn find_user_by_address(&self, address: &WalletAddress) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock();
        Ok(tables
            .users_by_address
            .get(address.as_str())
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    fn find_or_create_user(&self, address: &WalletAddress) -> Result<User, StoreError> {
        let mut tables = self.tables.lock();
        if let Some(id) = tables.users_by_address.get(address.as_str()) {
            let id = id.clone();
            return Ok(tables.users[&id].clone());
        }
        let user = factory::build_user(address);
        tables
            .users_by_address
            .insert(address.as_str().to_string(), user.id.clone());
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn get_user(&self, id: &str) -> Result<User, StoreError> {
        self.tables
            .lock()
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    fn insert_round(&self, new: NewRound) -> Result<Round, StoreError> {
        let round = factory::build_round(new);
        self.tables
            .lock()
            .rounds
            .insert(round.id.clone(), round.clone());
        Ok(round)
    }

    fn get_round(&self, id: &str) -> Result<Round, StoreError> {
        self.tables
            .lock()
            .rounds
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("round", id))
    }

    fn update_round_status(&self, id: &str, status: RoundStatus) -> Result<Round, StoreError> {
        let mut tables = self.tables.lock();
        let round = tables
            .rounds
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("round", id))?;
        round.status = status;
        Ok(round.clone())
    }

    fn complete_round(&self, id: &str, winner_user_id: &str) -> Result<Round, StoreError> {
        let mut tables = self.tables.lock();
        let round = tables
            .rounds
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("round", id))?;
        round.status = RoundStatus::Completed;
        round.winner_user_id = Some(winner_user_id.to_string());
        Ok(round.clone())
    }

    fn insert_topic(&self, new: NewTopic) -> Result<Topic, StoreError> {
        let topic = factory::build_topic(new);
        self.tables
            .lock()
            .topics
            .insert(topic.id.clone(), topic.clone());
        Ok(topic)
    }

    fn get_topic(&self, id: &str) -> Result<Topic, StoreError> {
        self.tables
            .lock()
            .topics
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("topic", id))
    }

    fn set_topic_votes(&self, id: &str, votes: u64) -> Result<Topic, StoreError> {
        let mut tables = self.tables.lock();
        let topic = tables
            .topics
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("topic", id))?;
        topic.votes = votes;
        Ok(topic.clone())
    }

    fn increment_topic_votes(&self, id: &str) -> Result<Topic, StoreError> {
        let mut tables = self.tables.lock();
        let topic = tables
            .topics
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("topic", id))?;
        topic.votes += 1;
        Ok(topic.clone())
    }

    fn insert_entry(&self, new: NewArenaEntry) -> Result<ArenaEntry, StoreError> {
        let entry = factory::build_entry(new);
        self.tables
            .lock()
            .entries
            .insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    fn insert_task_request(&self, new: NewTaskRequest) -> Result<TaskRequest, StoreError> {
        let request = factory::build_task_request(new);
        self.tables
            .lock()
            .requests
            .insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn get_task_request(&self, id: &str) -> Result<TaskRequest, StoreError> {
        self.tables
            .lock()
            .requests
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("task request", id))
    }

    fn update_task_request_status(
        &self,
        id: &str,
        status: TaskRequestStatus,
    ) -> Result<TaskRequest, StoreError> {
        let mut tables = self.tables.lock();
        let request = tables
            .requests
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("task request", id))?;
        request.status = status;
        Ok(request.clone())
    }

    fn insert_proposal(&self, new: NewProposal) -> Result<Proposal, StoreError> {
        let proposal = factory::build_proposal(new);
        self.tables
            .lock()
            .proposals
            .insert(proposal.id.clone(), proposal.clone());
        Ok(proposal)
    }

    fn get_proposal(&self, id: &str) -> Result<Proposal, StoreError> {
        self.tables
            .lock()
            .proposals
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("proposal", id))
    }

    fn set_proposal_status(
        &self,
        id: &str,
        status: ProposalStatus,
    ) -> Result<Proposal, StoreError> {
        let mut tables = self.tables.lock();
        let proposal = tables
            .proposals
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("proposal", id))?;
        proposal.status = status;
        Ok(proposal.clone())
    }

    fn accept_proposal(&self, proposal_id: &str) -> Result<(Proposal, TaskRequest), StoreError> {
        // Single lock: both rows flip together or the error leaves both
        // untouched.
        let mut tables = self.tables.lock();
        let (request_id, bidder_id) = {
            let proposal = tables
                .proposals
                .get(proposal_id)
                .ok_or_else(|| StoreError::not_found("proposal", proposal_id))?;
            (proposal.request_id.clone(), proposal.bidder_user_id.clone())
        };
        if !tables.requests.contains_key(&request_id) {
            return Err(StoreError::not_found("task request", request_id));
        }

        let proposal = tables
            .proposals
            .get_mut(proposal_id)
            .ok_or_else(|| StoreError::not_found("proposal", proposal_id))?;
        proposal.status = ProposalStatus::Accepted;
        let proposal = proposal.clone();

        let request = tables
            .requests
            .get_mut(&request_id)
            .ok_or_else(|| StoreError::not_found("task request", request_id.clone()))?;
        request.status = TaskRequestStatus::InProgress;
        request.assigned_worker_id = Some(bidder_id);
        Ok((proposal, request.clone()))
    }

    fn insert_escrow(&self, new: NewEscrowDeal) -> Result<EscrowDeal, StoreError> {
        let deal = factory::build_escrow(new);
        self.tables
            .lock()
            .escrows
            .insert(deal.id.clone(), deal.clone());
        Ok(deal)
    }

    fn get_escrow(&self, id: &str) -> Result<EscrowDeal, StoreError> {
        self.tables
            .lock()
            .escrows
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("escrow deal", id))
    }

    fn update_escrow_status(
        &self,
        id: &str,
        status: EscrowStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<EscrowDeal, StoreError> {
        let mut tables = self.tables.lock();
        let deal = tables
            .escrows
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("escrow deal", id))?;
        deal.status = status;
        if completed_at.is_some() {
            deal.completed_at = completed_at;
        }
        Ok(deal.clone())
    }

    fn insert_direct(&self, new: NewDirectRequest) -> Result<DirectRequest, StoreError> {
        let deal = factory::build_direct(new);
        let mut tables = self.tables.lock();
        tables.direct_order.push(deal.id.clone());
        tables.directs.insert(deal.id.clone(), deal.clone());
        Ok(deal)
    }

    fn get_direct(&self, id: &str) -> Result<DirectRequest, StoreError> {
        self.tables
            .lock()
            .directs
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("direct deal", id))
    }

    fn update_direct_status(
        &self,
        id: &str,
        status: DirectStatus,
    ) -> Result<DirectRequest, StoreError> {
        let mut tables = self.tables.lock();
        let deal = tables
            .directs
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("direct deal", id))?;
        deal.status = status;
        Ok(deal.clone())
    }

    fn list_direct(&self, filter: &DirectFilter) -> Result<Vec<DirectRequest>, StoreError> {
        let tables = self.tables.lock();
        Ok(tables
            .direct_order
            .iter()
            .rev()
            .filter_map(|id| tables.directs.get(id))
            .filter(|deal| {
                filter.agent.as_ref().is_none_or(|a| &deal.agent_address == a)
                    && filter
                        .client
                        .as_ref()
                        .is_none_or(|c| &deal.client_address == c)
                    && filter.status.is_none_or(|s| deal.status == s)
                    && filter.either.as_ref().is_none_or(|e| {
                        &deal.agent_address == e || &deal.client_address == e
                    })
            })
            .cloned()
            .collect())
    }
}
