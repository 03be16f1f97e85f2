//! Per-domain reconciliation services. Each service owns the validator
//! rules for its entity family and writes through the store port only after
//! the ledger cross-checks pass.

pub mod arena;
pub mod direct;
pub mod escrow;
pub mod marketplace;

use primitive_types::U256;

use crate::errors::ReconcileError;

/// Narrow a ledger-scaled uint256 into the projection's integer amounts.
pub(crate) fn ledger_amount(value: U256, field: &str) -> Result<u64, ReconcileError> {
    if value > U256::from(u64::MAX) {
        return Err(ReconcileError::upstream(format!(
            "ledger {field} exceeds integer range: {value}"
        )));
    }
    Ok(value.low_u64())
}
