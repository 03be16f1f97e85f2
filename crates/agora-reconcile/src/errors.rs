//! # Reconciliation Error Taxonomy
//!
//! One enum, five failure classes, each with a fixed HTTP mapping at the
//! gateway boundary. A [`ReconcileError::LedgerMismatch`] is never retried
//! automatically: retrying without new ledger state fails identically.

use agora_ledger::LedgerError;
use agora_store::StoreError;
use agora_types::AddressError;
use thiserror::Error;

/// Failure classes for reconciliation actions.
#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    /// Malformed or missing required input (HTTP 400).
    #[error("{0}")]
    Validation(String),

    /// On-chain truth disagrees with the requested write (HTTP 403).
    #[error("{0}")]
    LedgerMismatch(String),

    /// Referenced row or ledger object absent (HTTP 404).
    #[error("{0}")]
    NotFound(String),

    /// Caller is not the entity permitted to act (HTTP 403).
    #[error("{0}")]
    Authorization(String),

    /// Store or RPC failure (HTTP 500).
    #[error("{0}")]
    Upstream(String),
}

impl ReconcileError {
    pub fn validation(message: impl Into<String>) -> Self {
        ReconcileError::Validation(message.into())
    }

    pub fn ledger_mismatch(message: impl Into<String>) -> Self {
        ReconcileError::LedgerMismatch(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ReconcileError::NotFound(message.into())
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        ReconcileError::Authorization(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        ReconcileError::Upstream(message.into())
    }
}

impl From<StoreError> for ReconcileError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ReconcileError::NotFound(err.to_string()),
            StoreError::Backend(_) => ReconcileError::Upstream(err.to_string()),
        }
    }
}

impl From<LedgerError> for ReconcileError {
    fn from(err: LedgerError) -> Self {
        // Chain mismatch is an endpoint/configuration fault, not a caller
        // fault: it surfaces as upstream failure, and no read is trusted.
        ReconcileError::Upstream(err.to_string())
    }
}

impl From<AddressError> for ReconcileError {
    fn from(err: AddressError) -> Self {
        ReconcileError::Validation(err.to_string())
    }
}
