//! Adapters implementing the ledger port: JSON-RPC for production, an
//! in-memory fake for tests.

pub mod abi;
pub mod fake;
pub mod rpc;
