// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and address helpers.

use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;

/// Default time to wait for a write to be included in a block.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Identity registry connection settings.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// JSON-RPC endpoint URL
    pub rpc_url: String,
    /// Deployed registry contract address
    pub contract_address: String,
    /// Upper bound on waiting for a write receipt
    pub confirmation_timeout: Duration,
}

/// Death attestation stored against a soul-bound token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeathRecord {
    /// CID of the evidence metadata in the content-addressed store
    pub metadata_cid: String,
    /// Block timestamp (seconds) at which the death was recorded
    pub timestamp: u64,
}

/// A confirmed (mined) registry write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxConfirmation {
    /// Transaction hash (0x-prefixed)
    pub transaction_hash: String,
    /// Block the transaction was included in
    pub block_number: u64,
}

/// Reasons a wallet address string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressFormatError {
    #[error("address must start with 0x")]
    MissingPrefix,

    #[error("address must be 42 characters (0x + 40 hex)")]
    InvalidLength,

    #[error("address must contain only hex characters")]
    InvalidHex,

    #[error("address has an invalid EIP-55 checksum")]
    InvalidChecksum,
}

/// Parse a user-supplied EVM address.
///
/// Mixed-case input must carry a valid EIP-55 checksum. All-lowercase or
/// all-uppercase hex is accepted without checksum verification.
pub fn parse_address(raw: &str) -> Result<Address, AddressFormatError> {
    let raw = raw.trim();
    let Some(hex) = raw.strip_prefix("0x") else {
        return Err(AddressFormatError::MissingPrefix);
    };
    if raw.len() != 42 {
        return Err(AddressFormatError::InvalidLength);
    }
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AddressFormatError::InvalidHex);
    }

    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        Address::parse_checksummed(raw, None).map_err(|_| AddressFormatError::InvalidChecksum)
    } else {
        Address::from_str(raw).map_err(|_| AddressFormatError::InvalidHex)
    }
}
