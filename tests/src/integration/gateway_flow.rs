//! # Gateway Flows
//!
//! End-to-end through the HTTP router: action dispatch, status-code
//! mapping, and the committed row mirrored back as JSON.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use agora_gateway::{build_router, AppState};
    use agora_ledger::{FakeLedger, LedgerReader, OnChainDeal, OnChainRound};
    use agora_store::{InMemoryStore, ProjectionStore};
    use agora_types::WalletAddress;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use primitive_types::U256;
    use serde_json::json;
    use tower::ServiceExt;

    const CLIENT: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const AGENT: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn setup() -> (Router, Arc<FakeLedger>) {
        let store = Arc::new(InMemoryStore::new());
        let ledger = Arc::new(FakeLedger::new());
        let state = AppState::new(
            store as Arc<dyn ProjectionStore>,
            Arc::clone(&ledger) as Arc<dyn LedgerReader>,
        );
        (build_router(state), ledger)
    }

    fn post(path: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// Round creation and advancement over HTTP, with the mismatch case
    /// surfacing as 403 and naming both statuses.
    #[tokio::test]
    async fn test_arena_flow_over_http() {
        let (router, ledger) = setup();
        ledger.insert_round(
            7,
            OnChainRound {
                sequence: U256::one(),
                prize: U256::from(1000u64),
                status_code: 1,
                ..Default::default()
            },
        );

        let (status, round) = send(
            &router,
            post("/api/arena", json!({ "action": "createRound", "ledgerRoundId": 7 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(round["status"], "proposing");
        let round_id = round["id"].as_str().unwrap().to_string();

        let (status, advanced) = send(
            &router,
            post(
                "/api/arena",
                json!({ "action": "advanceRound", "roundId": round_id, "targetStatus": "voting" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(advanced["status"], "voting");

        let (status, failure) = send(
            &router,
            post(
                "/api/arena",
                json!({ "action": "advanceRound", "roundId": round_id, "targetStatus": "active" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let message = failure["error"].as_str().unwrap();
        assert!(message.contains("active") && message.contains("voting"));
    }

    /// Escrow creation over HTTP: a mismatched requester address is 403,
    /// adopting from the ledger succeeds.
    #[tokio::test]
    async fn test_escrow_flow_over_http() {
        let (router, ledger) = setup();
        ledger.insert_deal(
            42,
            OnChainDeal {
                client: WalletAddress::parse(CLIENT).unwrap(),
                agent: WalletAddress::parse(AGENT).unwrap(),
                remaining: U256::from(500u64),
                deadline: 0,
                status_code: 0,
            },
        );

        let (status, failure) = send(
            &router,
            post(
                "/api/escrow",
                json!({
                    "action": "createEscrow",
                    "ledgerDealId": 42,
                    "requesterAddress": AGENT,
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(failure["error"].as_str().unwrap().contains("client"));

        let (status, deal) = send(
            &router,
            post(
                "/api/escrow",
                json!({ "action": "createEscrow", "ledgerDealId": 42 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deal["amount"], 500);
        assert_eq!(deal["status"], "created");
    }

    /// The direct-deal lifecycle plus the GET filter endpoint.
    #[tokio::test]
    async fn test_direct_flow_over_http() {
        let (router, _) = setup();
        let deadline = (chrono::Utc::now() + chrono::Duration::days(2)).to_rfc3339();

        let (status, deal) = send(
            &router,
            post(
                "/api/direct-deals",
                json!({
                    "action": "createDeal",
                    "clientAddress": CLIENT,
                    "agentAddress": AGENT,
                    "amount": 300,
                    "description": "summarize filings",
                    "deadline": deadline,
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let deal_id = deal["id"].as_str().unwrap().to_string();

        // Wrong actor → 403
        let (status, _) = send(
            &router,
            post(
                "/api/direct-deals",
                json!({ "action": "acceptDeal", "dealId": deal_id, "agentAddress": CLIENT }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Correct agent → accepted
        let (status, accepted) = send(
            &router,
            post(
                "/api/direct-deals",
                json!({ "action": "acceptDeal", "dealId": deal_id, "agentAddress": AGENT }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(accepted["status"], "accepted");

        // Second accept → wrong state → 400
        let (status, _) = send(
            &router,
            post(
                "/api/direct-deals",
                json!({ "action": "acceptDeal", "dealId": deal_id, "agentAddress": AGENT }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Either-side filter finds the deal
        let (status, listed) = send(
            &router,
            Request::get(format!("/api/direct-deals?address={AGENT}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["status"], "accepted");
    }

    /// Proposal acceptance over HTTP: non-requester → 403 and nothing
    /// committed; requester → both rows move.
    #[tokio::test]
    async fn test_proposal_flow_over_http() {
        let (router, _) = setup();
        let deadline = (chrono::Utc::now() + chrono::Duration::days(5)).to_rfc3339();

        let (_, request) = send(
            &router,
            post(
                "/api/marketplace/requests",
                json!({
                    "action": "createRequest",
                    "requesterAddress": CLIENT,
                    "title": "build a scraper",
                    "description": "robots.txt respecting",
                    "budget": 1000,
                    "deadline": deadline,
                }),
            ),
        )
        .await;
        let request_id = request["id"].as_str().unwrap().to_string();

        let (_, proposal) = send(
            &router,
            post(
                "/api/marketplace/proposals",
                json!({
                    "action": "createProposal",
                    "requestId": request_id,
                    "bidderAddress": AGENT,
                    "price": 900,
                    "estimatedDays": 4,
                    "message": "can do",
                }),
            ),
        )
        .await;
        let proposal_id = proposal["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &router,
            post(
                "/api/marketplace/proposals",
                json!({
                    "action": "acceptProposal",
                    "proposalId": proposal_id,
                    "callerAddress": AGENT,
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, accepted) = send(
            &router,
            post(
                "/api/marketplace/proposals",
                json!({
                    "action": "acceptProposal",
                    "proposalId": proposal_id,
                    "callerAddress": CLIENT,
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(accepted["status"], "accepted");
    }
}
