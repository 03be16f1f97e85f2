//! # Marketplace Service
//!
//! Task requests and proposals. Proposal acceptance is the only
//! ownership-gated two-row transition in the system: requester-only, and
//! the parent request moves to in_progress with the worker assigned in the
//! same store operation.

use std::sync::Arc;

use agora_store::{NewProposal, NewTaskRequest, ProjectionStore};
use agora_types::{
    Proposal, ProposalStatus, TaskRequest, TaskRequestStatus, WalletAddress,
};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::actions::{ProposalAction, TaskRequestAction};
use crate::errors::ReconcileError;
use crate::identity::IdentityResolver;

/// Handlers for marketplace requests and proposals.
pub struct MarketplaceService {
    store: Arc<dyn ProjectionStore>,
    identity: IdentityResolver,
}

impl MarketplaceService {
    pub fn new(store: Arc<dyn ProjectionStore>) -> Self {
        let identity = IdentityResolver::new(Arc::clone(&store));
        Self { store, identity }
    }

    pub async fn handle_request(
        &self,
        action: TaskRequestAction,
    ) -> Result<serde_json::Value, ReconcileError> {
        let request = match action {
            TaskRequestAction::CreateRequest {
                requester_address,
                title,
                description,
                budget,
                deadline,
            } => {
                self.create_request(&requester_address, title, description, budget, deadline)?
            }
            TaskRequestAction::CancelRequest {
                request_id,
                requester_address,
            } => self.cancel_request(&request_id, &requester_address)?,
        };
        serde_json::to_value(request).map_err(|e| ReconcileError::upstream(e.to_string()))
    }

    pub async fn handle_proposal(
        &self,
        action: ProposalAction,
    ) -> Result<serde_json::Value, ReconcileError> {
        let proposal = match action {
            ProposalAction::CreateProposal {
                request_id,
                bidder_address,
                price,
                estimated_days,
                message,
            } => self.create_proposal(&request_id, &bidder_address, price, estimated_days, message)?,
            ProposalAction::AcceptProposal {
                proposal_id,
                caller_address,
            } => self.accept_proposal(&proposal_id, &caller_address)?,
            ProposalAction::RejectProposal {
                proposal_id,
                caller_address,
            } => self.reject_proposal(&proposal_id, &caller_address)?,
        };
        serde_json::to_value(proposal).map_err(|e| ReconcileError::upstream(e.to_string()))
    }

    pub fn create_request(
        &self,
        requester_address: &str,
        title: String,
        description: String,
        budget: u64,
        deadline: DateTime<Utc>,
    ) -> Result<TaskRequest, ReconcileError> {
        if title.trim().is_empty() {
            return Err(ReconcileError::validation("title must not be empty"));
        }
        let requester = self.identity.resolve_str(requester_address)?;
        Ok(self.store.insert_task_request(NewTaskRequest {
            requester_user_id: requester.id,
            title,
            description,
            budget,
            deadline,
        })?)
    }

    /// Requester-only, and only while the request is still open.
    pub fn cancel_request(
        &self,
        request_id: &str,
        requester_address: &str,
    ) -> Result<TaskRequest, ReconcileError> {
        let request = self.store.get_task_request(request_id)?;
        self.require_requester(&request, requester_address)?;
        if request.status != TaskRequestStatus::Open {
            return Err(ReconcileError::validation(format!(
                "request {request_id} is '{}', only open requests can be cancelled",
                request.status
            )));
        }
        Ok(self
            .store
            .update_task_request_status(request_id, TaskRequestStatus::Cancelled)?)
    }

    pub fn create_proposal(
        &self,
        request_id: &str,
        bidder_address: &str,
        price: u64,
        estimated_days: u32,
        message: String,
    ) -> Result<Proposal, ReconcileError> {
        let request = self.store.get_task_request(request_id)?;
        if request.status != TaskRequestStatus::Open {
            return Err(ReconcileError::validation(format!(
                "request {request_id} is '{}', not open for proposals",
                request.status
            )));
        }
        let bidder = self.identity.resolve_str(bidder_address)?;
        Ok(self.store.insert_proposal(NewProposal {
            request_id: request.id,
            bidder_user_id: bidder.id,
            price,
            estimated_days,
            message,
        })?)
    }

    /// Accept a proposal: requester-only. The proposal flips to accepted
    /// and the parent request to in_progress with the bidder assigned,
    /// through one store operation so both rows move together.
    pub fn accept_proposal(
        &self,
        proposal_id: &str,
        caller_address: &str,
    ) -> Result<Proposal, ReconcileError> {
        let proposal = self.store.get_proposal(proposal_id)?;
        let request = self.store.get_task_request(&proposal.request_id)?;
        self.require_requester(&request, caller_address)?;

        if proposal.status.is_terminal() {
            return Err(ReconcileError::validation(format!(
                "proposal {proposal_id} is already '{}'",
                proposal.status
            )));
        }

        let (accepted, updated) = self.store.accept_proposal(proposal_id)?;
        info!(
            proposal_id = %accepted.id,
            request_id = %updated.id,
            worker = %accepted.bidder_user_id,
            "proposal accepted"
        );
        Ok(accepted)
    }

    /// Reject a proposal: requester-only, terminal.
    pub fn reject_proposal(
        &self,
        proposal_id: &str,
        caller_address: &str,
    ) -> Result<Proposal, ReconcileError> {
        let proposal = self.store.get_proposal(proposal_id)?;
        let request = self.store.get_task_request(&proposal.request_id)?;
        self.require_requester(&request, caller_address)?;

        if proposal.status.is_terminal() {
            return Err(ReconcileError::validation(format!(
                "proposal {proposal_id} is already '{}'",
                proposal.status
            )));
        }
        Ok(self
            .store
            .set_proposal_status(proposal_id, ProposalStatus::Rejected)?)
    }

    /// Only the request's original requester may act on its proposals. An
    /// unknown caller cannot be the requester, so no row is created here.
    fn require_requester(
        &self,
        request: &TaskRequest,
        caller_address: &str,
    ) -> Result<(), ReconcileError> {
        let caller = WalletAddress::parse(caller_address)?;
        let user = self.identity.lookup(&caller)?;
        match user {
            Some(user) if user.id == request.requester_user_id => Ok(()),
            _ => Err(ReconcileError::authorization(format!(
                "{caller} is not the requester of request {}",
                request.id
            ))),
        }
    }
}
