//! # Outbound Port: the Ledger Oracle
//!
//! The narrow read-only interface the reconciliation services depend on.
//! One method per query shape; implementations must verify they are talking
//! to the expected network before any answer is trusted.

use agora_types::WalletAddress;
use async_trait::async_trait;

use crate::domain::entities::{OnChainDeal, OnChainRound, OnChainTopic};
use crate::domain::errors::LedgerError;

/// Typed read accessors over the authoritative ledger.
///
/// Every call is a fresh point-in-time read. Unknown ids yield zeroed
/// records (see the `exists` helpers on the record types), matching the
/// contracts' public-mapping getters.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Read an arena round by its ledger id.
    async fn round_by_id(&self, round_id: u64) -> Result<OnChainRound, LedgerError>;

    /// Read a topic by its ledger id.
    async fn topic_by_id(&self, topic_id: u64) -> Result<OnChainTopic, LedgerError>;

    /// Read an escrow deal by its ledger id.
    async fn deal_by_id(&self, deal_id: u64) -> Result<OnChainDeal, LedgerError>;

    /// Whether `voter` has already cast a vote in the given round.
    async fn has_voted(&self, round_id: u64, voter: &WalletAddress) -> Result<bool, LedgerError>;
}
