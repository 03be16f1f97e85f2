//! # JSON-RPC Ledger Adapter
//!
//! Implements [`LedgerReader`] over `eth_call` against the arena and escrow
//! contracts. Every accessor first asserts the endpoint's reported chain id
//! equals the configured one — a mismatched endpoint is never queried
//! further, so the projection can never be validated against the wrong
//! network.

use agora_types::WalletAddress;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::adapters::abi;
use crate::domain::entities::{OnChainDeal, OnChainRound, OnChainTopic};
use crate::domain::errors::LedgerError;
use crate::ports::outbound::LedgerReader;

const SIG_GET_ROUND: &str = "getRound(uint256)";
const SIG_GET_TOPIC: &str = "getTopic(uint256)";
const SIG_GET_DEAL: &str = "getDeal(uint256)";
const SIG_HAS_VOTED: &str = "hasVoted(uint256,address)";

/// Connection parameters for the ledger endpoint.
#[derive(Debug, Clone)]
pub struct LedgerEndpoint {
    pub rpc_url: String,
    /// Chain id the endpoint must report before any read is trusted.
    pub expected_chain_id: u64,
    pub arena_contract: WalletAddress,
    pub escrow_contract: WalletAddress,
}

/// Production [`LedgerReader`] speaking JSON-RPC.
pub struct JsonRpcLedger {
    http: reqwest::Client,
    endpoint: LedgerEndpoint,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<serde_json::Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl JsonRpcLedger {
    pub fn new(endpoint: LedgerEndpoint) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }

    async fn rpc(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, LedgerError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response: RpcResponse = self
            .http
            .post(&self.endpoint.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Rpc(format!("{method}: {e}")))?
            .json()
            .await
            .map_err(|e| LedgerError::Rpc(format!("{method}: invalid response: {e}")))?;

        if let Some(err) = response.error {
            return Err(LedgerError::Rpc(format!("{method}: {} (code {})", err.message, err.code)));
        }
        response
            .result
            .ok_or_else(|| LedgerError::Rpc(format!("{method}: empty result")))
    }

    /// Hex-quantity decode, e.g. `"0x89"` → 137.
    fn quantity(value: &serde_json::Value) -> Result<u64, LedgerError> {
        let raw = value
            .as_str()
            .ok_or_else(|| LedgerError::Decode("quantity is not a string".into()))?;
        let stripped = raw.strip_prefix("0x").unwrap_or(raw);
        u64::from_str_radix(stripped, 16).map_err(|e| LedgerError::Decode(format!("quantity {raw}: {e}")))
    }

    /// Assert the endpoint reports the configured chain id. Fails closed.
    async fn guard_chain(&self) -> Result<(), LedgerError> {
        let reported = Self::quantity(&self.rpc("eth_chainId", json!([])).await?)?;
        if reported != self.endpoint.expected_chain_id {
            warn!(
                expected = self.endpoint.expected_chain_id,
                reported, "refusing ledger read from mismatched chain"
            );
            return Err(LedgerError::ChainMismatch {
                expected: self.endpoint.expected_chain_id,
                actual: reported,
            });
        }
        Ok(())
    }

    async fn eth_call(&self, to: &WalletAddress, data: Vec<u8>) -> Result<Vec<u8>, LedgerError> {
        let params = json!([
            { "to": to.as_str(), "data": format!("0x{}", hex::encode(&data)) },
            "latest",
        ]);
        let result = self.rpc("eth_call", params).await?;
        let raw = result
            .as_str()
            .ok_or_else(|| LedgerError::Decode("eth_call result is not a string".into()))?;
        hex::decode(raw.strip_prefix("0x").unwrap_or(raw))
            .map_err(|e| LedgerError::Decode(format!("eth_call result hex: {e}")))
    }
}

#[async_trait]
impl LedgerReader for JsonRpcLedger {
    async fn round_by_id(&self, round_id: u64) -> Result<OnChainRound, LedgerError> {
        self.guard_chain().await?;
        let data = abi::calldata(SIG_GET_ROUND, &[abi::encode_u256(round_id.into())]);
        let out = self.eth_call(&self.endpoint.arena_contract, data).await?;

        // (uint256 sequence, uint256 prize, address winner, uint8 status, uint256 selectedTopicId)
        Ok(OnChainRound {
            sequence: abi::decode_u256(&out, 0)?,
            prize: abi::decode_u256(&out, 1)?,
            winner: abi::decode_address(&out, 2)?,
            status_code: abi::decode_u8(&out, 3)?,
            selected_topic_id: abi::decode_u64(&out, 4)?,
        })
    }

    async fn topic_by_id(&self, topic_id: u64) -> Result<OnChainTopic, LedgerError> {
        self.guard_chain().await?;
        let data = abi::calldata(SIG_GET_TOPIC, &[abi::encode_u256(topic_id.into())]);
        let out = self.eth_call(&self.endpoint.arena_contract, data).await?;

        // (uint256 roundId, address proposer, string title, string description, uint256 voteTotal)
        Ok(OnChainTopic {
            round_id: abi::decode_u64(&out, 0)?,
            proposer: abi::decode_address(&out, 1)?,
            title: abi::decode_string(&out, 2)?,
            description: abi::decode_string(&out, 3)?,
            vote_total: abi::decode_u64(&out, 4)?,
        })
    }

    async fn deal_by_id(&self, deal_id: u64) -> Result<OnChainDeal, LedgerError> {
        self.guard_chain().await?;
        let data = abi::calldata(SIG_GET_DEAL, &[abi::encode_u256(deal_id.into())]);
        let out = self.eth_call(&self.endpoint.escrow_contract, data).await?;

        // (address client, address agent, uint256 remaining, uint256 deadline, uint8 status)
        Ok(OnChainDeal {
            client: abi::decode_address(&out, 0)?,
            agent: abi::decode_address(&out, 1)?,
            remaining: abi::decode_u256(&out, 2)?,
            deadline: abi::decode_u64(&out, 3)?,
            status_code: abi::decode_u8(&out, 4)?,
        })
    }

    async fn has_voted(&self, round_id: u64, voter: &WalletAddress) -> Result<bool, LedgerError> {
        self.guard_chain().await?;
        let data = abi::calldata(
            SIG_HAS_VOTED,
            &[abi::encode_u256(round_id.into()), abi::encode_address(voter)?],
        );
        let out = self.eth_call(&self.endpoint.arena_contract, data).await?;
        abi::decode_bool(&out, 0)
    }
}
