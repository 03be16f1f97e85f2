//! # Escrow Service
//!
//! Escrow deal reconciliation. A deal anchored to a ledger deal id adopts
//! identities from the contract where the caller omits them, and its status
//! can only be driven to where the contract already is. Release is the
//! strictest transition: completed on-chain AND zero remaining funds.

use std::sync::Arc;

use agora_ledger::{escrow_status_from_code, LedgerReader, DEAL_COMPLETED_CODE};
use agora_store::{NewEscrowDeal, NewTaskRequest, ProjectionStore};
use agora_types::{EscrowDeal, EscrowStatus, RowId, WalletAddress};
use chrono::{Duration, Utc};
use tracing::info;

use crate::actions::EscrowAction;
use crate::errors::ReconcileError;
use crate::identity::IdentityResolver;
use crate::services::ledger_amount;

/// Placeholder request deadline when a deal arrives without a parent.
const PLACEHOLDER_DEADLINE_DAYS: i64 = 30;

/// Handlers for the escrow domain.
pub struct EscrowService {
    store: Arc<dyn ProjectionStore>,
    ledger: Arc<dyn LedgerReader>,
    identity: IdentityResolver,
}

impl EscrowService {
    pub fn new(store: Arc<dyn ProjectionStore>, ledger: Arc<dyn LedgerReader>) -> Self {
        let identity = IdentityResolver::new(Arc::clone(&store));
        Self {
            store,
            ledger,
            identity,
        }
    }

    pub async fn handle(&self, action: EscrowAction) -> Result<serde_json::Value, ReconcileError> {
        match action {
            EscrowAction::CreateEscrow {
                ledger_deal_id,
                requester_address,
                worker_address,
                request_id,
                amount,
            } => {
                let deal = self
                    .create_escrow(ledger_deal_id, requester_address, worker_address, request_id, amount)
                    .await?;
                serde_json::to_value(deal).map_err(|e| ReconcileError::upstream(e.to_string()))
            }
            EscrowAction::UpdateStatus {
                deal_id,
                target_status,
            } => {
                let deal = self.update_status(&deal_id, target_status).await?;
                serde_json::to_value(deal).map_err(|e| ReconcileError::upstream(e.to_string()))
            }
        }
    }

    /// Create an escrow deal.
    ///
    /// With a ledger deal id, a supplied requester address must match the
    /// contract's client; with none supplied, the client address is adopted
    /// — callers who only know the deal id supply nothing else. The worker
    /// side falls back to the contract's agent address the same way.
    pub async fn create_escrow(
        &self,
        ledger_deal_id: Option<u64>,
        requester_address: Option<String>,
        worker_address: Option<String>,
        request_id: Option<String>,
        amount: Option<u64>,
    ) -> Result<EscrowDeal, ReconcileError> {
        let supplied_requester = requester_address
            .as_deref()
            .map(WalletAddress::parse)
            .transpose()?;
        let supplied_worker = worker_address
            .as_deref()
            .map(WalletAddress::parse)
            .transpose()?;

        let (requester, worker, amount) = match ledger_deal_id {
            Some(deal_id) => {
                let on_chain = self.ledger.deal_by_id(deal_id).await?;
                if !on_chain.exists() {
                    return Err(ReconcileError::not_found(format!(
                        "ledger deal {deal_id} does not exist"
                    )));
                }
                let requester = match supplied_requester {
                    Some(addr) if addr != on_chain.client => {
                        return Err(ReconcileError::ledger_mismatch(format!(
                            "ledger deal {deal_id} belongs to client {}, not {addr}",
                            on_chain.client
                        )));
                    }
                    Some(addr) => addr,
                    None => on_chain.client.clone(),
                };
                let worker = supplied_worker.unwrap_or_else(|| on_chain.agent.clone());
                let amount = match amount {
                    Some(v) => v,
                    None => ledger_amount(on_chain.remaining, "deal amount")?,
                };
                (requester, worker, amount)
            }
            None => {
                let requester = supplied_requester.ok_or_else(|| {
                    ReconcileError::validation("requesterAddress is required without a ledger deal")
                })?;
                let worker = supplied_worker.ok_or_else(|| {
                    ReconcileError::validation("workerAddress is required without a ledger deal")
                })?;
                let amount = amount.ok_or_else(|| {
                    ReconcileError::validation("amount is required without a ledger deal")
                })?;
                (requester, worker, amount)
            }
        };

        let requester_user = self.identity.resolve(&requester)?;
        let worker_user = self.identity.resolve(&worker)?;

        // Every deal has a parent request; synthesize one when the caller
        // did not name an originating request.
        let request_id = match request_id {
            Some(id) => self.store.get_task_request(&id)?.id,
            None => self.synthesize_request(&requester_user.id, amount)?,
        };

        let deal = self.store.insert_escrow(NewEscrowDeal {
            request_id,
            requester_user_id: requester_user.id,
            worker_user_id: worker_user.id,
            amount,
            ledger_deal_id,
        })?;
        info!(deal_id = %deal.id, ?ledger_deal_id, "escrow deal created");
        Ok(deal)
    }

    /// Drive a deal's status.
    ///
    /// Ledger-backed rules: `released` requires the completed status code
    /// AND a remaining amount of exactly zero — funds must actually have
    /// been swept, not merely marked complete. Any other target must equal
    /// the ledger-derived status. Reaching `completed` stamps the
    /// completion timestamp.
    pub async fn update_status(
        &self,
        deal_id: &str,
        target: EscrowStatus,
    ) -> Result<EscrowDeal, ReconcileError> {
        let deal = self.store.get_escrow(deal_id)?;

        if let Some(ledger_deal_id) = deal.ledger_deal_id {
            let on_chain = self.ledger.deal_by_id(ledger_deal_id).await?;
            if target == EscrowStatus::Released {
                if on_chain.status_code != DEAL_COMPLETED_CODE {
                    return Err(ReconcileError::ledger_mismatch(format!(
                        "ledger deal {ledger_deal_id} is '{}', not completed",
                        escrow_status_from_code(on_chain.status_code)?
                    )));
                }
                if !on_chain.remaining.is_zero() {
                    return Err(ReconcileError::ledger_mismatch(format!(
                        "ledger deal {ledger_deal_id} still holds {} unswept",
                        on_chain.remaining
                    )));
                }
            } else {
                let derived = escrow_status_from_code(on_chain.status_code)?;
                if target != derived {
                    return Err(ReconcileError::ledger_mismatch(format!(
                        "requested status '{target}' but ledger deal {ledger_deal_id} reports '{derived}'"
                    )));
                }
            }
        }

        let completed_at = (target == EscrowStatus::Completed).then(Utc::now);
        Ok(self.store.update_escrow_status(deal_id, target, completed_at)?)
    }

    fn synthesize_request(&self, requester_user_id: &str, amount: u64) -> Result<RowId, ReconcileError> {
        let request = self.store.insert_task_request(NewTaskRequest {
            requester_user_id: requester_user_id.to_string(),
            title: "Escrowed task".to_string(),
            description: "Auto-created parent for a standalone escrow deal".to_string(),
            budget: amount,
            deadline: Utc::now() + Duration::days(PLACEHOLDER_DEADLINE_DAYS),
        })?;
        Ok(request.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_ledger::{FakeLedger, OnChainDeal};
    use primitive_types::U256;

    use agora_store::InMemoryStore;

    const ALICE: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const BOB: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const CAROL: &str = "0xcccccccccccccccccccccccccccccccccccccccc";

    fn service() -> (EscrowService, Arc<FakeLedger>, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let ledger = Arc::new(FakeLedger::new());
        let service = EscrowService::new(
            Arc::clone(&store) as Arc<dyn ProjectionStore>,
            Arc::clone(&ledger) as Arc<dyn LedgerReader>,
        );
        (service, ledger, store)
    }

    fn seed_deal(ledger: &FakeLedger, id: u64, remaining: u64, status_code: u8) {
        ledger.insert_deal(
            id,
            OnChainDeal {
                client: WalletAddress::parse(ALICE).unwrap(),
                agent: WalletAddress::parse(BOB).unwrap(),
                remaining: U256::from(remaining),
                deadline: 0,
                status_code,
            },
        );
    }

    #[tokio::test]
    async fn test_create_rejects_wrong_client() {
        let (service, ledger, _) = service();
        seed_deal(&ledger, 42, 500, 0);

        let err = service
            .create_escrow(Some(42), Some(CAROL.into()), None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::LedgerMismatch(_)));
    }

    #[tokio::test]
    async fn test_create_adopts_ledger_identities() {
        let (service, ledger, store) = service();
        seed_deal(&ledger, 42, 500, 0);

        // No addresses supplied: both sides resolved from the contract
        let deal = service
            .create_escrow(Some(42), None, None, None, None)
            .await
            .unwrap();
        assert_eq!(deal.amount, 500);
        assert_eq!(deal.ledger_deal_id, Some(42));

        let requester = store.get_user(&deal.requester_user_id).unwrap();
        assert_eq!(requester.address, WalletAddress::parse(ALICE).unwrap());
        let worker = store.get_user(&deal.worker_user_id).unwrap();
        assert_eq!(worker.address, WalletAddress::parse(BOB).unwrap());

        // A parent request was synthesized
        let parent = store.get_task_request(&deal.request_id).unwrap();
        assert_eq!(parent.budget, 500);
    }

    #[tokio::test]
    async fn test_create_missing_ledger_deal() {
        let (service, _, _) = service();
        let err = service
            .create_escrow(Some(99), None, None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_off_ledger_requires_fields() {
        let (service, _, _) = service();
        let err = service
            .create_escrow(None, Some(ALICE.into()), None, None, Some(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Validation(_)));

        let deal = service
            .create_escrow(None, Some(ALICE.into()), Some(BOB.into()), None, Some(100))
            .await
            .unwrap();
        assert_eq!(deal.ledger_deal_id, None);
        assert_eq!(deal.status, EscrowStatus::Created);
    }

    #[tokio::test]
    async fn test_release_requires_completed_and_swept() {
        let (service, ledger, _) = service();
        seed_deal(&ledger, 42, 500, 1); // funded, funds held
        let deal = service
            .create_escrow(Some(42), None, None, None, None)
            .await
            .unwrap();

        // Not completed on-chain
        let err = service
            .update_status(&deal.id, EscrowStatus::Released)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::LedgerMismatch(_)));

        // Completed but funds not swept
        seed_deal(&ledger, 42, 500, DEAL_COMPLETED_CODE);
        let err = service
            .update_status(&deal.id, EscrowStatus::Released)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::LedgerMismatch(_)));

        // Completed and zero remaining
        seed_deal(&ledger, 42, 0, DEAL_COMPLETED_CODE);
        let released = service
            .update_status(&deal.id, EscrowStatus::Released)
            .await
            .unwrap();
        assert_eq!(released.status, EscrowStatus::Released);
    }

    #[tokio::test]
    async fn test_other_targets_must_match_ledger() {
        let (service, ledger, _) = service();
        seed_deal(&ledger, 42, 500, 0); // created
        let deal = service
            .create_escrow(Some(42), None, None, None, None)
            .await
            .unwrap();

        let err = service
            .update_status(&deal.id, EscrowStatus::Funded)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::LedgerMismatch(_)));

        seed_deal(&ledger, 42, 500, 1); // now funded on-chain
        let funded = service
            .update_status(&deal.id, EscrowStatus::Funded)
            .await
            .unwrap();
        assert_eq!(funded.status, EscrowStatus::Funded);
        assert!(funded.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_completed_stamps_timestamp() {
        let (service, ledger, _) = service();
        seed_deal(&ledger, 42, 500, DEAL_COMPLETED_CODE);
        let deal = service
            .create_escrow(Some(42), None, None, None, None)
            .await
            .unwrap();

        let completed = service
            .update_status(&deal.id, EscrowStatus::Completed)
            .await
            .unwrap();
        assert!(completed.completed_at.is_some());
    }
}
