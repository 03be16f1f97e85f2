//! # API Gateway
//!
//! HTTP surface for the reconciliation layer.
//!
//! ## Endpoints
//!
//! | Method | Path | Payload |
//! |--------|------|---------|
//! | POST | `/api/arena` | [`agora_reconcile::ArenaAction`] |
//! | POST | `/api/escrow` | [`agora_reconcile::EscrowAction`] |
//! | POST | `/api/marketplace/requests` | [`agora_reconcile::TaskRequestAction`] |
//! | POST | `/api/marketplace/proposals` | [`agora_reconcile::ProposalAction`] |
//! | POST | `/api/direct-deals` | [`agora_reconcile::DirectAction`] |
//! | GET | `/api/direct-deals` | `?agent=&client=&status=&address=` |
//! | GET | `/health` | — |
//!
//! Success responses mirror the committed row. Failures are serialized by
//! one boundary into `{ "error": string }` with 400/403/404/500.

pub mod config;
pub mod error;
pub mod router;
pub mod service;

pub use config::GatewayConfig;
pub use error::ApiFailure;
pub use router::{build_router, AppState};
pub use service::{serve, GatewayError};
