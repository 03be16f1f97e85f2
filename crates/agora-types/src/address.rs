//! # Wallet Addresses
//!
//! Hex wallet addresses arrive from callers in arbitrary case and are the
//! natural key for user auto-provisioning, so every address is normalized
//! to its lowercase `0x`-prefixed form at the boundary. Two addresses that
//! differ only in case are the same address.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of hex characters in an address body (20 bytes).
const ADDRESS_HEX_LEN: usize = 40;

/// Errors raised while parsing a wallet address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Missing the `0x` prefix.
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),

    /// Wrong number of hex characters after the prefix.
    #[error("address must be {expected} hex chars, got {actual}")]
    BadLength { expected: usize, actual: usize },

    /// Non-hex character in the address body.
    #[error("address contains non-hex character: {0}")]
    NotHex(String),
}

/// A wallet address, stored in normalized (lowercase) form.
///
/// Construction goes through [`WalletAddress::parse`], which validates the
/// `0x` prefix, length, and hex body. Equality and hashing operate on the
/// normalized form, so case differences never produce distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parse and normalize an address string.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let trimmed = raw.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(trimmed.to_string()))?;

        if body.len() != ADDRESS_HEX_LEN {
            return Err(AddressError::BadLength {
                expected: ADDRESS_HEX_LEN,
                actual: body.len(),
            });
        }
        if !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressError::NotHex(trimmed.to_string()));
        }

        Ok(Self(format!("0x{}", body.to_ascii_lowercase())))
    }

    /// The normalized `0x`-prefixed lowercase form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The all-zero address, the ledger's sentinel for "unset".
    pub fn zero() -> Self {
        Self(format!("0x{}", "0".repeat(ADDRESS_HEX_LEN)))
    }

    /// True for the all-zero address.
    pub fn is_zero(&self) -> bool {
        self.0[2..].bytes().all(|b| b == b'0')
    }

    /// Abbreviated form used as a default display name, e.g. `0x1234…cdef`.
    pub fn short(&self) -> String {
        format!("{}…{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WalletAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(addr: WalletAddress) -> Self {
        addr.0
    }
}
