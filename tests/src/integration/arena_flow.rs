//! # Arena Flows
//!
//! The round lifecycle against the fake ledger: creation gated on ledger
//! existence, advancement gated on the ledger's current status, votes
//! gated on recorded on-chain votes.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use agora_ledger::{FakeLedger, LedgerReader, OnChainRound, OnChainTopic};
    use agora_reconcile::{ArenaService, ReconcileError};
    use agora_store::{InMemoryStore, ProjectionStore};
    use agora_types::{RoundStatus, WalletAddress};
    use primitive_types::U256;

    const ALICE: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const BOB: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn setup() -> (ArenaService, Arc<FakeLedger>, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let ledger = Arc::new(FakeLedger::new());
        let service = ArenaService::new(
            Arc::clone(&store) as Arc<dyn ProjectionStore>,
            Arc::clone(&ledger) as Arc<dyn LedgerReader>,
        );
        (service, ledger, store)
    }

    /// Scenario: ledger round 7 reports (seq=1, prize=1000). The projection
    /// round is created at proposing with the ledger's prize; advancing to
    /// voting succeeds while the ledger reports voting, and advancing to
    /// active at that point fails naming both statuses.
    #[tokio::test]
    async fn test_round_lifecycle_follows_ledger() {
        let (service, ledger, _) = setup();
        ledger.insert_round(
            7,
            OnChainRound {
                sequence: U256::one(),
                prize: U256::from(1000u64),
                status_code: 1, // Voting
                ..Default::default()
            },
        );

        let round = service.create_round(7, None).await.unwrap();
        assert_eq!(round.status, RoundStatus::Proposing);
        assert_eq!(round.prize, 1000);
        assert_eq!(round.sequence, 1);

        let voting = service
            .advance_round(&round.id, RoundStatus::Voting)
            .await
            .unwrap();
        assert_eq!(voting.status, RoundStatus::Voting);

        let err = service
            .advance_round(&round.id, RoundStatus::Active)
            .await
            .unwrap_err();
        match err {
            ReconcileError::LedgerMismatch(msg) => {
                assert!(msg.contains("active") && msg.contains("voting"));
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    /// The full forward walk as the ledger advances through every phase,
    /// including both on-chain active sub-phases mapping to one status.
    #[tokio::test]
    async fn test_full_forward_walk() {
        let (service, ledger, _) = setup();
        let seed = |code: u8| OnChainRound {
            sequence: U256::one(),
            prize: U256::from(1000u64),
            status_code: code,
            ..Default::default()
        };
        ledger.insert_round(7, seed(0));
        let round = service.create_round(7, None).await.unwrap();

        for (code, status) in [
            (1, RoundStatus::Voting),
            (2, RoundStatus::Active),
            (3, RoundStatus::Active),
            (4, RoundStatus::Judging),
            (5, RoundStatus::Completed),
        ] {
            ledger.insert_round(7, seed(code));
            let advanced = service.advance_round(&round.id, status).await.unwrap();
            assert_eq!(advanced.status, status);
        }
    }

    /// Vote sync: rejected until the ledger records the vote, then the
    /// tally adopts the ledger total and stays idempotent.
    #[tokio::test]
    async fn test_vote_sync_against_ledger() {
        let (service, ledger, _) = setup();
        ledger.insert_round(
            7,
            OnChainRound {
                sequence: U256::one(),
                prize: U256::from(1000u64),
                status_code: 1,
                ..Default::default()
            },
        );
        ledger.insert_topic(
            3,
            OnChainTopic {
                round_id: 7,
                proposer: WalletAddress::parse(ALICE).unwrap(),
                title: "agents that file taxes".into(),
                description: "why not".into(),
                vote_total: 1,
            },
        );

        let round = service.create_round(7, None).await.unwrap();
        let topic = service
            .propose_topic(&round.id, ALICE, "agents that file taxes".into(), "why not".into(), Some(3))
            .await
            .unwrap();

        let premature = service.vote_for_topic(&topic.id, BOB).await;
        assert!(matches!(premature, Err(ReconcileError::LedgerMismatch(_))));

        ledger.record_vote(7, WalletAddress::parse(BOB).unwrap());
        assert_eq!(service.vote_for_topic(&topic.id, BOB).await.unwrap().votes, 1);
        assert_eq!(service.vote_for_topic(&topic.id, BOB).await.unwrap().votes, 1);
    }

    /// A chain-id mismatch fails every ledger-backed action closed.
    #[tokio::test]
    async fn test_chain_mismatch_blocks_reconciliation() {
        let (service, ledger, _) = setup();
        ledger.insert_round(
            7,
            OnChainRound {
                sequence: U256::one(),
                prize: U256::from(1000u64),
                ..Default::default()
            },
        );
        ledger.report_chain_id(1337);

        let err = service.create_round(7, None).await.unwrap_err();
        assert!(matches!(err, ReconcileError::Upstream(_)));
    }
}
