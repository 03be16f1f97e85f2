//! # Router
//!
//! Route table and request handlers. Action payloads are deserialized into
//! their closed per-domain enums explicitly, so a malformed body or unknown
//! action tag becomes the same 400 `{ "error": ... }` shape as every other
//! validation failure.

use std::str::FromStr;
use std::sync::Arc;

use agora_ledger::LedgerReader;
use agora_reconcile::{
    ArenaAction, ArenaService, DirectAction, DirectDealService, EscrowAction, EscrowService,
    MarketplaceService, ProposalAction, ReconcileError, TaskRequestAction,
};
use agora_store::{DirectFilter, ProjectionStore};
use agora_types::{DirectStatus, WalletAddress};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::ApiFailure;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub arena: Arc<ArenaService>,
    pub escrow: Arc<EscrowService>,
    pub marketplace: Arc<MarketplaceService>,
    pub direct: Arc<DirectDealService>,
}

impl AppState {
    pub fn new(store: Arc<dyn ProjectionStore>, ledger: Arc<dyn LedgerReader>) -> Self {
        Self {
            arena: Arc::new(ArenaService::new(Arc::clone(&store), Arc::clone(&ledger))),
            escrow: Arc::new(EscrowService::new(Arc::clone(&store), Arc::clone(&ledger))),
            marketplace: Arc::new(MarketplaceService::new(Arc::clone(&store))),
            direct: Arc::new(DirectDealService::new(store, ledger)),
        }
    }
}

/// Build the route table.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/arena", post(arena))
        .route("/api/escrow", post(escrow))
        .route("/api/marketplace/requests", post(marketplace_requests))
        .route("/api/marketplace/proposals", post(marketplace_proposals))
        .route("/api/direct-deals", post(direct_deals).get(list_direct_deals))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Deserialize an action payload, folding serde failures into the 400 class.
fn parse_action<T: serde::de::DeserializeOwned>(
    body: serde_json::Value,
) -> Result<T, ApiFailure> {
    serde_json::from_value(body)
        .map_err(|e| ApiFailure(ReconcileError::validation(format!("invalid action payload: {e}"))))
}

async fn arena(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let action: ArenaAction = parse_action(body)?;
    Ok(Json(state.arena.handle(action).await?))
}

async fn escrow(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let action: EscrowAction = parse_action(body)?;
    Ok(Json(state.escrow.handle(action).await?))
}

async fn marketplace_requests(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let action: TaskRequestAction = parse_action(body)?;
    Ok(Json(state.marketplace.handle_request(action).await?))
}

async fn marketplace_proposals(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let action: ProposalAction = parse_action(body)?;
    Ok(Json(state.marketplace.handle_proposal(action).await?))
}

async fn direct_deals(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let action: DirectAction = parse_action(body)?;
    Ok(Json(state.direct.handle(action).await?))
}

/// Query parameters for the direct-deal listing.
#[derive(Debug, Default, Deserialize)]
pub struct DirectListParams {
    pub agent: Option<String>,
    pub client: Option<String>,
    pub status: Option<String>,
    /// Matches deals where the address sits on either side.
    pub address: Option<String>,
}

impl DirectListParams {
    fn into_filter(self) -> Result<DirectFilter, ReconcileError> {
        Ok(DirectFilter {
            agent: self.agent.as_deref().map(WalletAddress::parse).transpose()?,
            client: self.client.as_deref().map(WalletAddress::parse).transpose()?,
            status: self
                .status
                .as_deref()
                .map(DirectStatus::from_str)
                .transpose()
                .map_err(ReconcileError::Validation)?,
            either: self
                .address
                .as_deref()
                .map(WalletAddress::parse)
                .transpose()?,
        })
    }
}

async fn list_direct_deals(
    State(state): State<AppState>,
    Query(params): Query<DirectListParams>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let filter = params.into_filter()?;
    let deals = state.direct.list(&filter)?;
    serde_json::to_value(deals)
        .map(Json)
        .map_err(|e| ApiFailure(ReconcileError::upstream(e.to_string())))
}
