//! # Arena Service
//!
//! Round, topic, vote, and entry reconciliation. Rounds exist off-chain
//! only after the ledger confirms them; status advances only to where the
//! ledger already is; tallies only move when the ledger has recorded the
//! vote.

use std::sync::Arc;

use agora_ledger::{round_status_from_code, LedgerReader};
use agora_store::{NewArenaEntry, NewRound, NewTopic, ProjectionStore};
use agora_types::{ArenaEntry, Round, RoundStatus, Topic, WalletAddress};
use tracing::info;

use crate::actions::ArenaAction;
use crate::errors::ReconcileError;
use crate::identity::IdentityResolver;
use crate::services::ledger_amount;

/// Handlers for the arena domain.
pub struct ArenaService {
    store: Arc<dyn ProjectionStore>,
    ledger: Arc<dyn LedgerReader>,
    identity: IdentityResolver,
}

impl ArenaService {
    pub fn new(store: Arc<dyn ProjectionStore>, ledger: Arc<dyn LedgerReader>) -> Self {
        let identity = IdentityResolver::new(Arc::clone(&store));
        Self {
            store,
            ledger,
            identity,
        }
    }

    /// Exhaustive dispatch; the response mirrors the committed row.
    pub async fn handle(&self, action: ArenaAction) -> Result<serde_json::Value, ReconcileError> {
        match action {
            ArenaAction::CreateRound {
                ledger_round_id,
                creator_address,
            } => to_json(self.create_round(ledger_round_id, creator_address).await?),
            ArenaAction::AdvanceRound {
                round_id,
                target_status,
            } => to_json(self.advance_round(&round_id, target_status).await?),
            ArenaAction::ProposeTopic {
                round_id,
                proposer_address,
                title,
                description,
                ledger_topic_id,
            } => to_json(
                self.propose_topic(&round_id, &proposer_address, title, description, ledger_topic_id)
                    .await?,
            ),
            ArenaAction::VoteForTopic {
                topic_id,
                voter_address,
            } => to_json(self.vote_for_topic(&topic_id, &voter_address).await?),
            ArenaAction::SubmitEntry {
                round_id,
                submitter_address,
                repository_url,
                description,
                demo_url,
                ledger_entry_id,
            } => to_json(
                self.submit_entry(
                    &round_id,
                    &submitter_address,
                    repository_url,
                    description,
                    demo_url,
                    ledger_entry_id,
                )
                .await?,
            ),
            ArenaAction::SelectWinner {
                round_id,
                winner_address,
            } => to_json(self.select_winner(&round_id, winner_address).await?),
        }
    }

    /// Create a projection round for a ledger round that must already exist.
    pub async fn create_round(
        &self,
        ledger_round_id: u64,
        creator_address: Option<String>,
    ) -> Result<Round, ReconcileError> {
        let creator = creator_address
            .as_deref()
            .map(WalletAddress::parse)
            .transpose()?;

        let on_chain = self.ledger.round_by_id(ledger_round_id).await?;
        if !on_chain.exists() {
            return Err(ReconcileError::not_found(format!(
                "ledger round {ledger_round_id} does not exist"
            )));
        }

        let round = self.store.insert_round(NewRound {
            sequence: ledger_amount(on_chain.sequence, "round sequence")?,
            prize: ledger_amount(on_chain.prize, "round prize")?,
            ledger_round_id: Some(ledger_round_id),
            creator_address: creator,
        })?;
        info!(round_id = %round.id, ledger_round_id, "round created from ledger");
        Ok(round)
    }

    /// Advance a round's status.
    ///
    /// Ledger-backed rounds advance only to the exact status the ledger
    /// currently reports; off-ledger rounds advance freely forward.
    pub async fn advance_round(
        &self,
        round_id: &str,
        target: RoundStatus,
    ) -> Result<Round, ReconcileError> {
        let round = self.store.get_round(round_id)?;

        match round.ledger_round_id {
            Some(ledger_round_id) => {
                let on_chain = self.ledger.round_by_id(ledger_round_id).await?;
                let derived = round_status_from_code(on_chain.status_code)?;
                if target != derived {
                    return Err(ReconcileError::ledger_mismatch(format!(
                        "requested status '{target}' but ledger round {ledger_round_id} reports '{derived}'"
                    )));
                }
            }
            None => {
                if !round.status.allows_advance_to(target) {
                    return Err(ReconcileError::validation(format!(
                        "round status only moves forward: current '{}', requested '{target}'",
                        round.status
                    )));
                }
            }
        }

        Ok(self.store.update_round_status(round_id, target)?)
    }

    /// Insert a topic, cross-checking the on-chain proposer when a ledger
    /// topic id is supplied.
    pub async fn propose_topic(
        &self,
        round_id: &str,
        proposer_address: &str,
        title: String,
        description: String,
        ledger_topic_id: Option<u64>,
    ) -> Result<Topic, ReconcileError> {
        let proposer = WalletAddress::parse(proposer_address)?;
        let round = self.store.get_round(round_id)?;

        if let Some(topic_id) = ledger_topic_id {
            let on_chain = self.ledger.topic_by_id(topic_id).await?;
            if !on_chain.exists() {
                return Err(ReconcileError::not_found(format!(
                    "ledger topic {topic_id} does not exist"
                )));
            }
            if on_chain.proposer != proposer {
                return Err(ReconcileError::ledger_mismatch(format!(
                    "ledger topic {topic_id} was proposed by {}, not {proposer}",
                    on_chain.proposer
                )));
            }
        }

        let user = self.identity.resolve(&proposer)?;
        Ok(self.store.insert_topic(NewTopic {
            round_id: round.id,
            proposer_user_id: user.id,
            title,
            description,
            ledger_topic_id,
        })?)
    }

    /// Sync a vote into the projection tally.
    ///
    /// Ledger-backed topics require the ledger to have recorded the vote
    /// first, then adopt the ledger's reported total (so repeated syncs of
    /// one confirmed vote are idempotent, and the tally never regresses).
    /// Off-ledger topics use the store's atomic increment.
    pub async fn vote_for_topic(
        &self,
        topic_id: &str,
        voter_address: &str,
    ) -> Result<Topic, ReconcileError> {
        let voter = WalletAddress::parse(voter_address)?;
        let topic = self.store.get_topic(topic_id)?;

        match topic.ledger_topic_id {
            Some(ledger_topic_id) => {
                let on_chain = self.ledger.topic_by_id(ledger_topic_id).await?;
                if !on_chain.exists() {
                    return Err(ReconcileError::not_found(format!(
                        "ledger topic {ledger_topic_id} does not exist"
                    )));
                }
                let voted = self.ledger.has_voted(on_chain.round_id, &voter).await?;
                if !voted {
                    return Err(ReconcileError::ledger_mismatch(format!(
                        "ledger has not recorded a vote by {voter} in round {}",
                        on_chain.round_id
                    )));
                }
                let tally = topic.votes.max(on_chain.vote_total);
                Ok(self.store.set_topic_votes(topic_id, tally)?)
            }
            None => Ok(self.store.increment_topic_votes(topic_id)?),
        }
    }

    /// Record an arena entry; the ledger id is attached opportunistically.
    pub async fn submit_entry(
        &self,
        round_id: &str,
        submitter_address: &str,
        repository_url: String,
        description: String,
        demo_url: Option<String>,
        ledger_entry_id: Option<u64>,
    ) -> Result<ArenaEntry, ReconcileError> {
        let submitter = self.identity.resolve_str(submitter_address)?;
        let round = self.store.get_round(round_id)?;
        Ok(self.store.insert_entry(NewArenaEntry {
            round_id: round.id,
            submitter_user_id: submitter.id,
            repository_url,
            description,
            demo_url,
            ledger_entry_id,
        })?)
    }

    /// Complete a round and record its winner.
    ///
    /// Ledger-backed rounds take the winner from the contract and reject
    /// while it is still the zero address; off-ledger rounds name the
    /// winner in the payload.
    pub async fn select_winner(
        &self,
        round_id: &str,
        winner_address: Option<String>,
    ) -> Result<Round, ReconcileError> {
        let round = self.store.get_round(round_id)?;

        let winner = match round.ledger_round_id {
            Some(ledger_round_id) => {
                let on_chain = self.ledger.round_by_id(ledger_round_id).await?;
                if !on_chain.has_winner() {
                    return Err(ReconcileError::ledger_mismatch(format!(
                        "winner for ledger round {ledger_round_id} not yet selected on-chain"
                    )));
                }
                on_chain.winner
            }
            None => {
                let raw = winner_address.ok_or_else(|| {
                    ReconcileError::validation("winnerAddress is required for off-ledger rounds")
                })?;
                WalletAddress::parse(&raw)?
            }
        };

        let user = self.identity.resolve(&winner)?;
        let round = self.store.complete_round(&round.id, &user.id)?;
        info!(round_id = %round.id, winner = %winner, "round completed");
        Ok(round)
    }
}

fn to_json<T: serde::Serialize>(value: T) -> Result<serde_json::Value, ReconcileError> {
    serde_json::to_value(value).map_err(|e| ReconcileError::upstream(e.to_string()))
}
