//! # On-chain Records
//!
//! Decoded shapes of the contract state the reconciliation layer reads.
//! Contracts return zeroed structs for unknown ids rather than reverting,
//! so "does this exist" is a sentinel check on the decoded record.

use agora_types::WalletAddress;
use primitive_types::U256;

/// An arena round as reported by the arena contract.
#[derive(Debug, Clone, PartialEq)]
pub struct OnChainRound {
    pub sequence: U256,
    pub prize: U256,
    pub winner: WalletAddress,
    pub status_code: u8,
    pub selected_topic_id: u64,
}

impl OnChainRound {
    /// A round with sequence and prize both zero is the contract's way of
    /// answering "no such round".
    pub fn exists(&self) -> bool {
        !(self.sequence.is_zero() && self.prize.is_zero())
    }

    /// True once the contract has recorded a winner.
    pub fn has_winner(&self) -> bool {
        !self.winner.is_zero()
    }
}

impl Default for OnChainRound {
    fn default() -> Self {
        Self {
            sequence: U256::zero(),
            prize: U256::zero(),
            winner: WalletAddress::zero(),
            status_code: 0,
            selected_topic_id: 0,
        }
    }
}

/// A topic as reported by the arena contract.
#[derive(Debug, Clone, PartialEq)]
pub struct OnChainTopic {
    pub round_id: u64,
    pub proposer: WalletAddress,
    pub title: String,
    pub description: String,
    pub vote_total: u64,
}

impl OnChainTopic {
    pub fn exists(&self) -> bool {
        !self.proposer.is_zero()
    }
}

impl Default for OnChainTopic {
    fn default() -> Self {
        Self {
            round_id: 0,
            proposer: WalletAddress::zero(),
            title: String::new(),
            description: String::new(),
            vote_total: 0,
        }
    }
}

/// An escrow deal as reported by the escrow contract.
#[derive(Debug, Clone, PartialEq)]
pub struct OnChainDeal {
    pub client: WalletAddress,
    pub agent: WalletAddress,
    /// Funds not yet swept out of the deal, in ledger-scaled units.
    pub remaining: U256,
    pub deadline: u64,
    pub status_code: u8,
}

impl OnChainDeal {
    pub fn exists(&self) -> bool {
        !self.client.is_zero()
    }
}

impl Default for OnChainDeal {
    fn default() -> Self {
        Self {
            client: WalletAddress::zero(),
            agent: WalletAddress::zero(),
            remaining: U256::zero(),
            deadline: 0,
            status_code: 0,
        }
    }
}
