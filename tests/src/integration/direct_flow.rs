//! # Direct Deal Flows
//!
//! Agent-only acceptance, the double-accept race, and the accepted path
//! through settlement.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use agora_ledger::{FakeLedger, LedgerReader};
    use agora_reconcile::{DirectDealService, ReconcileError};
    use agora_store::{DirectFilter, InMemoryStore, ProjectionStore};
    use agora_types::{DirectStatus, WalletAddress};
    use chrono::{Duration, Utc};

    const CLIENT: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const AGENT: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn setup() -> DirectDealService {
        let store = Arc::new(InMemoryStore::new());
        let ledger = Arc::new(FakeLedger::new());
        DirectDealService::new(
            store as Arc<dyn ProjectionStore>,
            ledger as Arc<dyn LedgerReader>,
        )
    }

    /// Scenario: two accepts from the correct agent — the first moves
    /// pending → accepted, the second fails because the deal is no longer
    /// pending (a wrong-state failure, not a wrong-actor one).
    #[tokio::test]
    async fn test_double_accept() {
        let service = setup();
        let deal = service
            .create_deal(
                CLIENT,
                AGENT,
                300,
                "label my dataset".into(),
                Utc::now() + Duration::days(2),
                None,
            )
            .await
            .unwrap();

        let first = service.accept_deal(&deal.id, AGENT).unwrap();
        assert_eq!(first.status, DirectStatus::Accepted);

        let second = service.accept_deal(&deal.id, AGENT).unwrap_err();
        match second {
            ReconcileError::Validation(msg) => assert!(msg.contains("not pending")),
            other => panic!("expected wrong-state validation, got {other:?}"),
        }
    }

    /// Accept/reject from any other address is an authorization failure,
    /// regardless of deal state.
    #[tokio::test]
    async fn test_only_named_agent_acts() {
        let service = setup();
        let deal = service
            .create_deal(
                CLIENT,
                AGENT,
                300,
                "work".into(),
                Utc::now() + Duration::days(2),
                None,
            )
            .await
            .unwrap();

        let err = service.accept_deal(&deal.id, CLIENT).unwrap_err();
        assert!(matches!(err, ReconcileError::Authorization(_)));

        // Still pending: the failed call changed nothing
        let accepted = service.accept_deal(&deal.id, AGENT).unwrap();
        assert_eq!(accepted.status, DirectStatus::Accepted);
    }

    /// The accepted path walks escrow_created → funded → completed →
    /// released in order, and refuses to skip.
    #[tokio::test]
    async fn test_accepted_path_order() {
        let service = setup();
        let deal = service
            .create_deal(
                CLIENT,
                AGENT,
                300,
                "work".into(),
                Utc::now() + Duration::days(2),
                None,
            )
            .await
            .unwrap();
        service.accept_deal(&deal.id, AGENT).unwrap();

        for status in [
            DirectStatus::EscrowCreated,
            DirectStatus::Funded,
            DirectStatus::Completed,
            DirectStatus::Released,
        ] {
            let updated = service.update_status(&deal.id, status).await.unwrap();
            assert_eq!(updated.status, status);
        }

        // Terminal: nothing moves a released deal
        let err = service
            .update_status(&deal.id, DirectStatus::Funded)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Validation(_)));
    }

    /// Listing filters compose: by side, by status, by either-side address.
    #[tokio::test]
    async fn test_listing_filters() {
        let service = setup();
        let deadline = Utc::now() + Duration::days(2);
        let first = service
            .create_deal(CLIENT, AGENT, 100, "a".into(), deadline, None)
            .await
            .unwrap();
        service
            .create_deal(AGENT, CLIENT, 200, "b".into(), deadline, None)
            .await
            .unwrap();
        service.accept_deal(&first.id, AGENT).unwrap();

        let agent_side = service
            .list(&DirectFilter {
                agent: Some(WalletAddress::parse(AGENT).unwrap()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(agent_side.len(), 1);

        let either = service
            .list(&DirectFilter {
                either: Some(WalletAddress::parse(AGENT).unwrap()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(either.len(), 2);

        let pending_for_agent = service
            .list(&DirectFilter {
                either: Some(WalletAddress::parse(AGENT).unwrap()),
                status: Some(DirectStatus::Pending),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(pending_for_agent.len(), 1);
    }
}
