//! # Direct Deal Service
//!
//! Peer-to-peer deals bypassing the open marketplace. Accept/reject is
//! agent-only and pending-only, with wrong-actor and wrong-state rejected
//! for distinguishable reasons so callers can tell retry-safe from unsafe
//! failures. The accepted path reuses the escrow ledger checks.

use std::sync::Arc;

use agora_ledger::{escrow_status_from_code, LedgerReader, DEAL_COMPLETED_CODE};
use agora_store::{DirectFilter, NewDirectRequest, ProjectionStore};
use agora_types::{DirectRequest, DirectStatus, EscrowStatus, WalletAddress};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::actions::DirectAction;
use crate::errors::ReconcileError;
use crate::identity::IdentityResolver;

/// Handlers for the direct-deal domain.
pub struct DirectDealService {
    store: Arc<dyn ProjectionStore>,
    ledger: Arc<dyn LedgerReader>,
    identity: IdentityResolver,
}

impl DirectDealService {
    pub fn new(store: Arc<dyn ProjectionStore>, ledger: Arc<dyn LedgerReader>) -> Self {
        let identity = IdentityResolver::new(Arc::clone(&store));
        Self {
            store,
            ledger,
            identity,
        }
    }

    pub async fn handle(&self, action: DirectAction) -> Result<serde_json::Value, ReconcileError> {
        let deal = match action {
            DirectAction::CreateDeal {
                client_address,
                agent_address,
                amount,
                description,
                deadline,
                ledger_deal_id,
            } => {
                self.create_deal(
                    &client_address,
                    &agent_address,
                    amount,
                    description,
                    deadline,
                    ledger_deal_id,
                )
                .await?
            }
            DirectAction::AcceptDeal {
                deal_id,
                agent_address,
            } => self.accept_deal(&deal_id, &agent_address)?,
            DirectAction::RejectDeal {
                deal_id,
                agent_address,
            } => self.reject_deal(&deal_id, &agent_address)?,
            DirectAction::UpdateStatus {
                deal_id,
                target_status,
            } => self.update_status(&deal_id, target_status).await?,
        };
        serde_json::to_value(deal).map_err(|e| ReconcileError::upstream(e.to_string()))
    }

    /// Insert a pending deal, resolving both sides to users. A supplied
    /// ledger deal id is cross-checked against the contract's client.
    pub async fn create_deal(
        &self,
        client_address: &str,
        agent_address: &str,
        amount: u64,
        description: String,
        deadline: DateTime<Utc>,
        ledger_deal_id: Option<u64>,
    ) -> Result<DirectRequest, ReconcileError> {
        let client = WalletAddress::parse(client_address)?;
        let agent = WalletAddress::parse(agent_address)?;

        if let Some(deal_id) = ledger_deal_id {
            let on_chain = self.ledger.deal_by_id(deal_id).await?;
            if !on_chain.exists() {
                return Err(ReconcileError::not_found(format!(
                    "ledger deal {deal_id} does not exist"
                )));
            }
            if on_chain.client != client {
                return Err(ReconcileError::ledger_mismatch(format!(
                    "ledger deal {deal_id} belongs to client {}, not {client}",
                    on_chain.client
                )));
            }
        }

        let client_user = self.identity.resolve(&client)?;
        let agent_user = self.identity.resolve(&agent)?;

        let deal = self.store.insert_direct(NewDirectRequest {
            client_address: client,
            agent_address: agent,
            client_user_id: client_user.id,
            agent_user_id: agent_user.id,
            amount,
            description,
            deadline,
            ledger_deal_id,
        })?;
        info!(deal_id = %deal.id, "direct deal created");
        Ok(deal)
    }

    /// Agent-only, pending-only.
    pub fn accept_deal(
        &self,
        deal_id: &str,
        agent_address: &str,
    ) -> Result<DirectRequest, ReconcileError> {
        let deal = self.store.get_direct(deal_id)?;
        self.require_agent(&deal, agent_address)?;
        Self::require_pending(&deal)?;
        Ok(self.store.update_direct_status(deal_id, DirectStatus::Accepted)?)
    }

    /// Agent-only, pending-only.
    pub fn reject_deal(
        &self,
        deal_id: &str,
        agent_address: &str,
    ) -> Result<DirectRequest, ReconcileError> {
        let deal = self.store.get_direct(deal_id)?;
        self.require_agent(&deal, agent_address)?;
        Self::require_pending(&deal)?;
        Ok(self.store.update_direct_status(deal_id, DirectStatus::Rejected)?)
    }

    /// Drive the accepted path, or expire a stale pending deal.
    ///
    /// Transitions follow the deal state machine; ledger-backed rows are
    /// additionally confirmed against the contract for the settlement
    /// statuses, with release requiring completed-and-swept exactly like
    /// marketplace escrow.
    pub async fn update_status(
        &self,
        deal_id: &str,
        target: DirectStatus,
    ) -> Result<DirectRequest, ReconcileError> {
        let deal = self.store.get_direct(deal_id)?;

        if !deal.status.can_transition(target) {
            return Err(ReconcileError::validation(format!(
                "direct deal {deal_id} is '{}', cannot move to '{target}'",
                deal.status
            )));
        }

        if target == DirectStatus::Expired && deal.deadline > Utc::now() {
            return Err(ReconcileError::validation(format!(
                "direct deal {deal_id} deadline has not passed yet"
            )));
        }

        if let Some(ledger_deal_id) = deal.ledger_deal_id {
            self.check_ledger(ledger_deal_id, target).await?;
        }

        Ok(self.store.update_direct_status(deal_id, target)?)
    }

    pub fn get(&self, deal_id: &str) -> Result<DirectRequest, ReconcileError> {
        Ok(self.store.get_direct(deal_id)?)
    }

    pub fn list(&self, filter: &DirectFilter) -> Result<Vec<DirectRequest>, ReconcileError> {
        Ok(self.store.list_direct(filter)?)
    }

    async fn check_ledger(
        &self,
        ledger_deal_id: u64,
        target: DirectStatus,
    ) -> Result<(), ReconcileError> {
        // Acceptance and expiry are off-chain decisions; only the
        // settlement statuses are ledger-confirmed.
        let required = match target {
            DirectStatus::Funded => Some(EscrowStatus::Funded),
            DirectStatus::Completed => Some(EscrowStatus::Completed),
            _ => None,
        };

        match target {
            DirectStatus::EscrowCreated => {
                let on_chain = self.ledger.deal_by_id(ledger_deal_id).await?;
                if !on_chain.exists() {
                    return Err(ReconcileError::not_found(format!(
                        "ledger deal {ledger_deal_id} does not exist"
                    )));
                }
            }
            DirectStatus::Released => {
                let on_chain = self.ledger.deal_by_id(ledger_deal_id).await?;
                if on_chain.status_code != DEAL_COMPLETED_CODE || !on_chain.remaining.is_zero() {
                    return Err(ReconcileError::ledger_mismatch(format!(
                        "ledger deal {ledger_deal_id} is not completed with funds swept"
                    )));
                }
            }
            _ => {
                if let Some(required) = required {
                    let on_chain = self.ledger.deal_by_id(ledger_deal_id).await?;
                    let derived = escrow_status_from_code(on_chain.status_code)?;
                    if derived != required {
                        return Err(ReconcileError::ledger_mismatch(format!(
                            "requested status '{target}' but ledger deal {ledger_deal_id} reports '{derived}'"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Only the named agent on the row may act.
    fn require_agent(
        &self,
        deal: &DirectRequest,
        agent_address: &str,
    ) -> Result<(), ReconcileError> {
        let caller = WalletAddress::parse(agent_address)?;
        if caller != deal.agent_address {
            return Err(ReconcileError::authorization(format!(
                "{caller} is not the agent on direct deal {}",
                deal.id
            )));
        }
        // Keep the identity fresh even though the row already references it.
        self.identity.resolve(&caller)?;
        Ok(())
    }

    fn require_pending(deal: &DirectRequest) -> Result<(), ReconcileError> {
        if deal.status != DirectStatus::Pending {
            return Err(ReconcileError::validation(format!(
                "direct deal {} is '{}', not pending",
                deal.id, deal.status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_ledger::{FakeLedger, OnChainDeal};
    use agora_store::InMemoryStore;
    use chrono::Duration;
    use primitive_types::U256;

    const ALICE: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const BOB: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const CAROL: &str = "0xcccccccccccccccccccccccccccccccccccccccc";

    fn service() -> (DirectDealService, Arc<FakeLedger>) {
        let store = Arc::new(InMemoryStore::new());
        let ledger = Arc::new(FakeLedger::new());
        let service = DirectDealService::new(
            store as Arc<dyn ProjectionStore>,
            Arc::clone(&ledger) as Arc<dyn LedgerReader>,
        );
        (service, ledger)
    }

    async fn pending_deal(service: &DirectDealService) -> DirectRequest {
        service
            .create_deal(
                ALICE,
                BOB,
                250,
                "scrape and summarize".into(),
                Utc::now() + Duration::days(3),
                None,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_accept_then_second_accept_fails_on_state() {
        let (service, _) = service();
        let deal = pending_deal(&service).await;

        let accepted = service.accept_deal(&deal.id, BOB).unwrap();
        assert_eq!(accepted.status, DirectStatus::Accepted);

        // Correct agent, wrong state: distinguishable from wrong actor
        let err = service.accept_deal(&deal.id, BOB).unwrap_err();
        assert!(matches!(err, ReconcileError::Validation(_)));
    }

    #[tokio::test]
    async fn test_wrong_actor_is_authorization() {
        let (service, _) = service();
        let deal = pending_deal(&service).await;

        let err = service.accept_deal(&deal.id, CAROL).unwrap_err();
        assert!(matches!(err, ReconcileError::Authorization(_)));

        // The client cannot accept their own offer either
        let err = service.reject_deal(&deal.id, ALICE).unwrap_err();
        assert!(matches!(err, ReconcileError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_expire_requires_past_deadline_and_pending() {
        let (service, _) = service();
        let deal = service
            .create_deal(
                ALICE,
                BOB,
                250,
                "work".into(),
                Utc::now() - Duration::hours(1),
                None,
            )
            .await
            .unwrap();

        let expired = service
            .update_status(&deal.id, DirectStatus::Expired)
            .await
            .unwrap();
        assert_eq!(expired.status, DirectStatus::Expired);

        // Future deadline refuses to expire
        let fresh = pending_deal(&service).await;
        let err = service
            .update_status(&fresh.id, DirectStatus::Expired)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Validation(_)));
    }

    #[tokio::test]
    async fn test_accepted_path_follows_state_machine() {
        let (service, _) = service();
        let deal = pending_deal(&service).await;
        service.accept_deal(&deal.id, BOB).unwrap();

        // Cannot skip escrow creation
        let err = service
            .update_status(&deal.id, DirectStatus::Funded)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Validation(_)));

        let step = service
            .update_status(&deal.id, DirectStatus::EscrowCreated)
            .await
            .unwrap();
        assert_eq!(step.status, DirectStatus::EscrowCreated);
    }

    #[tokio::test]
    async fn test_ledger_backed_settlement_checks() {
        let (service, ledger) = service();
        ledger.insert_deal(
            9,
            OnChainDeal {
                client: WalletAddress::parse(ALICE).unwrap(),
                agent: WalletAddress::parse(BOB).unwrap(),
                remaining: U256::from(250u64),
                deadline: 0,
                status_code: 0,
            },
        );
        let deal = service
            .create_deal(
                ALICE,
                BOB,
                250,
                "work".into(),
                Utc::now() + Duration::days(3),
                Some(9),
            )
            .await
            .unwrap();

        service.accept_deal(&deal.id, BOB).unwrap();
        service
            .update_status(&deal.id, DirectStatus::EscrowCreated)
            .await
            .unwrap();

        // Ledger still says created: funding is premature
        let err = service
            .update_status(&deal.id, DirectStatus::Funded)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::LedgerMismatch(_)));

        ledger.insert_deal(
            9,
            OnChainDeal {
                client: WalletAddress::parse(ALICE).unwrap(),
                agent: WalletAddress::parse(BOB).unwrap(),
                remaining: U256::from(250u64),
                deadline: 0,
                status_code: 1,
            },
        );
        let funded = service
            .update_status(&deal.id, DirectStatus::Funded)
            .await
            .unwrap();
        assert_eq!(funded.status, DirectStatus::Funded);
    }

    #[tokio::test]
    async fn test_create_with_wrong_ledger_client_rejected() {
        let (service, ledger) = service();
        ledger.insert_deal(
            9,
            OnChainDeal {
                client: WalletAddress::parse(CAROL).unwrap(),
                agent: WalletAddress::parse(BOB).unwrap(),
                remaining: U256::from(250u64),
                deadline: 0,
                status_code: 0,
            },
        );

        let err = service
            .create_deal(
                ALICE,
                BOB,
                250,
                "work".into(),
                Utc::now() + Duration::days(3),
                Some(9),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::LedgerMismatch(_)));
    }
}
