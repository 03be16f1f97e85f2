//! # Contract ABI Plumbing
//!
//! Selector computation and 32-byte word encode/decode for the handful of
//! read calls this layer issues. Covers the static types the contracts
//! return (uint256, address, uint8, bool) plus offset-encoded strings.

use agora_types::WalletAddress;
use primitive_types::U256;
use sha3::{Digest, Keccak256};

use crate::domain::errors::LedgerError;

const WORD: usize = 32;

/// First four bytes of the Keccak-256 hash of the function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest[..4]);
    out
}

/// ABI-encode a uint256 argument.
pub fn encode_u256(value: U256) -> [u8; 32] {
    let mut out = [0u8; 32];
    value.to_big_endian(&mut out);
    out
}

/// ABI-encode an address argument (left-padded to a word).
pub fn encode_address(addr: &WalletAddress) -> Result<[u8; 32], LedgerError> {
    let bytes = hex::decode(&addr.as_str()[2..])
        .map_err(|e| LedgerError::Decode(format!("address hex: {e}")))?;
    let mut out = [0u8; 32];
    out[WORD - bytes.len()..].copy_from_slice(&bytes);
    Ok(out)
}

/// Assemble calldata: selector followed by the encoded arguments.
pub fn calldata(signature: &str, args: &[[u8; 32]]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + args.len() * WORD);
    data.extend_from_slice(&selector(signature));
    for arg in args {
        data.extend_from_slice(arg);
    }
    data
}

fn word(data: &[u8], index: usize) -> Result<&[u8], LedgerError> {
    let start = index * WORD;
    data.get(start..start + WORD)
        .ok_or_else(|| LedgerError::Decode(format!("missing word {index} in {}-byte response", data.len())))
}

/// Decode the word at `index` as a uint256.
pub fn decode_u256(data: &[u8], index: usize) -> Result<U256, LedgerError> {
    Ok(U256::from_big_endian(word(data, index)?))
}

/// Decode the word at `index` as a u64, rejecting values that do not fit.
pub fn decode_u64(data: &[u8], index: usize) -> Result<u64, LedgerError> {
    let value = decode_u256(data, index)?;
    if value > U256::from(u64::MAX) {
        return Err(LedgerError::Decode(format!("word {index} exceeds u64: {value}")));
    }
    Ok(value.low_u64())
}

/// Decode the word at `index` as a u8 status code.
pub fn decode_u8(data: &[u8], index: usize) -> Result<u8, LedgerError> {
    let value = decode_u64(data, index)?;
    u8::try_from(value).map_err(|_| LedgerError::Decode(format!("word {index} exceeds u8: {value}")))
}

/// Decode the word at `index` as an address (right-most 20 bytes).
pub fn decode_address(data: &[u8], index: usize) -> Result<WalletAddress, LedgerError> {
    let w = word(data, index)?;
    let hex_body = hex::encode(&w[WORD - 20..]);
    WalletAddress::parse(&format!("0x{hex_body}"))
        .map_err(|e| LedgerError::Decode(format!("address word {index}: {e}")))
}

/// Decode the word at `index` as a bool (0 or 1).
pub fn decode_bool(data: &[u8], index: usize) -> Result<bool, LedgerError> {
    match decode_u64(data, index)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(LedgerError::Decode(format!("word {index} is not a bool: {other}"))),
    }
}

/// Decode the dynamic string whose offset sits in the head word at `index`.
pub fn decode_string(data: &[u8], index: usize) -> Result<String, LedgerError> {
    let offset = decode_u64(data, index)? as usize;
    let len_word = data
        .get(offset..offset + WORD)
        .ok_or_else(|| LedgerError::Decode(format!("string offset {offset} out of bounds")))?;
    let len = U256::from_big_endian(len_word);
    if len > U256::from(data.len()) {
        return Err(LedgerError::Decode(format!("string length {len} out of bounds")));
    }
    let len = len.low_u64() as usize;
    let bytes = data
        .get(offset + WORD..offset + WORD + len)
        .ok_or_else(|| LedgerError::Decode("string body out of bounds".into()))?;
    String::from_utf8(bytes.to_vec()).map_err(|e| LedgerError::Decode(format!("string utf8: {e}")))
}
