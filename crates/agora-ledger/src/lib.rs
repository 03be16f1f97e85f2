//! # Ledger Client
//!
//! Read-only accessor to the authoritative on-chain state machine (arena
//! rounds/topics/votes and escrow deals). The reconciliation services
//! consult this crate before every ledger-backed projection write.
//!
//! ## Design
//!
//! - `ports/` exposes the [`LedgerReader`] trait the services depend on.
//! - `adapters/rpc` implements it over JSON-RPC `eth_call` with a chain-id
//!   guard that fails closed when the endpoint reports the wrong network.
//! - `adapters/fake` is the in-memory oracle used by unit and integration
//!   tests — validator logic is exercised without network access.
//!
//! All reads are point-in-time: every call re-queries, because a validator
//! must observe current truth.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::fake::FakeLedger;
pub use adapters::rpc::{JsonRpcLedger, LedgerEndpoint};
pub use domain::entities::{OnChainDeal, OnChainRound, OnChainTopic};
pub use domain::errors::LedgerError;
pub use domain::status_map::{escrow_status_from_code, round_status_from_code, DEAL_COMPLETED_CODE};
pub use ports::outbound::LedgerReader;
