//! # Escrow Flows
//!
//! Identity adoption from the ledger, client mismatch rejection, and the
//! completed-and-swept release rule.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use agora_ledger::{FakeLedger, LedgerReader, OnChainDeal, DEAL_COMPLETED_CODE};
    use agora_reconcile::{EscrowService, ReconcileError};
    use agora_store::{InMemoryStore, ProjectionStore};
    use agora_types::{EscrowStatus, WalletAddress};
    use primitive_types::U256;

    const CLIENT: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const AGENT: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const IMPOSTER: &str = "0xbadbadbadbadbadbadbadbadbadbadbadbadbad0";

    fn setup() -> (EscrowService, Arc<FakeLedger>, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let ledger = Arc::new(FakeLedger::new());
        let service = EscrowService::new(
            Arc::clone(&store) as Arc<dyn ProjectionStore>,
            Arc::clone(&ledger) as Arc<dyn LedgerReader>,
        );
        (service, ledger, store)
    }

    fn deal(remaining: u64, status_code: u8) -> OnChainDeal {
        OnChainDeal {
            client: WalletAddress::parse(CLIENT).unwrap(),
            agent: WalletAddress::parse(AGENT).unwrap(),
            remaining: U256::from(remaining),
            deadline: 0,
            status_code,
        }
    }

    /// Scenario: deal 42's ledger client differs from the caller-supplied
    /// address → rejected; the same call with no address adopts the
    /// ledger's client.
    #[tokio::test]
    async fn test_client_mismatch_and_adoption() {
        let (service, ledger, store) = setup();
        ledger.insert_deal(42, deal(500, 0));

        let err = service
            .create_escrow(Some(42), Some(IMPOSTER.into()), None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::LedgerMismatch(_)));

        let created = service
            .create_escrow(Some(42), None, None, None, None)
            .await
            .unwrap();
        let requester = store.get_user(&created.requester_user_id).unwrap();
        assert_eq!(requester.address, WalletAddress::parse(CLIENT).unwrap());
        let worker = store.get_user(&created.worker_user_id).unwrap();
        assert_eq!(worker.address, WalletAddress::parse(AGENT).unwrap());
    }

    /// Release succeeds iff ledger status is completed AND remaining is
    /// exactly zero; each condition alone is insufficient.
    #[tokio::test]
    async fn test_release_rule() {
        let (service, ledger, _) = setup();
        ledger.insert_deal(42, deal(500, 1));
        let escrow = service
            .create_escrow(Some(42), None, None, None, None)
            .await
            .unwrap();

        // funded, funds held
        assert!(matches!(
            service.update_status(&escrow.id, EscrowStatus::Released).await,
            Err(ReconcileError::LedgerMismatch(_))
        ));

        // swept but not completed
        ledger.insert_deal(42, deal(0, 1));
        assert!(matches!(
            service.update_status(&escrow.id, EscrowStatus::Released).await,
            Err(ReconcileError::LedgerMismatch(_))
        ));

        // completed but not swept
        ledger.insert_deal(42, deal(500, DEAL_COMPLETED_CODE));
        assert!(matches!(
            service.update_status(&escrow.id, EscrowStatus::Released).await,
            Err(ReconcileError::LedgerMismatch(_))
        ));

        // completed and swept
        ledger.insert_deal(42, deal(0, DEAL_COMPLETED_CODE));
        let released = service
            .update_status(&escrow.id, EscrowStatus::Released)
            .await
            .unwrap();
        assert_eq!(released.status, EscrowStatus::Released);
    }

    /// Off-ledger deals skip every ledger check by design.
    #[tokio::test]
    async fn test_off_ledger_path_skips_checks() {
        let (service, _, _) = setup();
        let escrow = service
            .create_escrow(None, Some(CLIENT.into()), Some(AGENT.into()), None, Some(750))
            .await
            .unwrap();

        let funded = service
            .update_status(&escrow.id, EscrowStatus::Funded)
            .await
            .unwrap();
        assert_eq!(funded.status, EscrowStatus::Funded);

        let completed = service
            .update_status(&escrow.id, EscrowStatus::Completed)
            .await
            .unwrap();
        assert!(completed.completed_at.is_some());
    }

    /// The synthesized parent request carries the deal's amount as budget.
    #[tokio::test]
    async fn test_placeholder_parent_request() {
        let (service, ledger, store) = setup();
        ledger.insert_deal(42, deal(500, 0));
        let escrow = service
            .create_escrow(Some(42), None, None, None, None)
            .await
            .unwrap();

        let parent = store.get_task_request(&escrow.request_id).unwrap();
        assert_eq!(parent.budget, 500);
        assert_eq!(parent.requester_user_id, escrow.requester_user_id);
    }
}
