//! # Fake Ledger
//!
//! In-memory oracle for unit and integration tests. Mirrors the contract
//! getters' behavior: unknown ids answer with zeroed records, and the chain
//! guard can be made to fail by reporting a different chain id.

use std::collections::{HashMap, HashSet};

use agora_types::WalletAddress;
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::entities::{OnChainDeal, OnChainRound, OnChainTopic};
use crate::domain::errors::LedgerError;
use crate::ports::outbound::LedgerReader;

#[derive(Default)]
struct FakeState {
    rounds: HashMap<u64, OnChainRound>,
    topics: HashMap<u64, OnChainTopic>,
    deals: HashMap<u64, OnChainDeal>,
    votes: HashSet<(u64, WalletAddress)>,
}

/// Test double for [`LedgerReader`].
pub struct FakeLedger {
    expected_chain_id: u64,
    reported_chain_id: RwLock<u64>,
    state: RwLock<FakeState>,
}

impl Default for FakeLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeLedger {
    pub fn new() -> Self {
        Self {
            expected_chain_id: 1,
            reported_chain_id: RwLock::new(1),
            state: RwLock::new(FakeState::default()),
        }
    }

    /// Make the next reads fail the chain guard.
    pub fn report_chain_id(&self, chain_id: u64) {
        *self.reported_chain_id.write() = chain_id;
    }

    pub fn insert_round(&self, round_id: u64, round: OnChainRound) {
        self.state.write().rounds.insert(round_id, round);
    }

    pub fn insert_topic(&self, topic_id: u64, topic: OnChainTopic) {
        self.state.write().topics.insert(topic_id, topic);
    }

    pub fn insert_deal(&self, deal_id: u64, deal: OnChainDeal) {
        self.state.write().deals.insert(deal_id, deal);
    }

    pub fn record_vote(&self, round_id: u64, voter: WalletAddress) {
        self.state.write().votes.insert((round_id, voter));
    }

    fn guard_chain(&self) -> Result<(), LedgerError> {
        let reported = *self.reported_chain_id.read();
        if reported != self.expected_chain_id {
            return Err(LedgerError::ChainMismatch {
                expected: self.expected_chain_id,
                actual: reported,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerReader for FakeLedger {
    async fn round_by_id(&self, round_id: u64) -> Result<OnChainRound, LedgerError> {
        self.guard_chain()?;
        Ok(self
            .state
            .read()
            .rounds
            .get(&round_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn topic_by_id(&self, topic_id: u64) -> Result<OnChainTopic, LedgerError> {
        self.guard_chain()?;
        Ok(self
            .state
            .read()
            .topics
            .get(&topic_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn deal_by_id(&self, deal_id: u64) -> Result<OnChainDeal, LedgerError> {
        self.guard_chain()?;
        Ok(self
            .state
            .read()
            .deals
            .get(&deal_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn has_voted(&self, round_id: u64, voter: &WalletAddress) -> Result<bool, LedgerError> {
        self.guard_chain()?;
        Ok(self
            .state
            .read()
            .votes
            .contains(&(round_id, voter.clone())))
    }
}
