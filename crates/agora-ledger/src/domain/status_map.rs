//! # On-chain Status Code Tables
//!
//! Fixed lookup tables mapping the contracts' numeric status codes into the
//! off-chain vocabularies. The arena contract distinguishes two active
//! sub-phases (submission and evaluation); the projection collapses both
//! into one `active` status.

use agora_types::{EscrowStatus, RoundStatus};

use super::errors::LedgerError;

/// Deal status code the escrow contract reports once work is completed.
/// Release additionally requires the remaining amount to be zero.
pub const DEAL_COMPLETED_CODE: u8 = 2;

/// Map an arena round status code to the off-chain vocabulary.
///
/// | code | on-chain phase      | off-chain  |
/// |------|---------------------|------------|
/// | 0    | Proposing           | proposing  |
/// | 1    | Voting              | voting     |
/// | 2    | Active (submission) | active     |
/// | 3    | Active (evaluation) | active     |
/// | 4    | Judging             | judging    |
/// | 5    | Completed           | completed  |
pub fn round_status_from_code(code: u8) -> Result<RoundStatus, LedgerError> {
    match code {
        0 => Ok(RoundStatus::Proposing),
        1 => Ok(RoundStatus::Voting),
        2 | 3 => Ok(RoundStatus::Active),
        4 => Ok(RoundStatus::Judging),
        5 => Ok(RoundStatus::Completed),
        code => Err(LedgerError::UnknownStatusCode {
            entity: "round",
            code,
        }),
    }
}

/// Map an escrow deal status code to the off-chain vocabulary.
///
/// `released` has no code of its own: it is the completed code plus a zero
/// remaining amount, checked by the caller.
pub fn escrow_status_from_code(code: u8) -> Result<EscrowStatus, LedgerError> {
    match code {
        0 => Ok(EscrowStatus::Created),
        1 => Ok(EscrowStatus::Funded),
        2 => Ok(EscrowStatus::Completed),
        3 => Ok(EscrowStatus::Disputed),
        4 => Ok(EscrowStatus::Refunded),
        code => Err(LedgerError::UnknownStatusCode {
            entity: "deal",
            code,
        }),
    }
}
