//! Error types for ledger reads.

use thiserror::Error;

/// Errors raised while reading the ledger.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// The RPC endpoint reports a different network than configured.
    ///
    /// Fails closed: no read from a mismatched chain is ever trusted.
    #[error("chain mismatch: expected chain id {expected}, endpoint reports {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Transport or JSON-RPC level failure.
    #[error("ledger rpc failed: {0}")]
    Rpc(String),

    /// Returned data did not decode as the expected tuple.
    #[error("ledger response decode failed: {0}")]
    Decode(String),

    /// A status code outside the documented table.
    #[error("unknown on-chain status code {code} for {entity}")]
    UnknownStatusCode { entity: &'static str, code: u8 },
}
