// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registrar key loading.
//!
//! The registrar key is supplied either as raw hex or as a PEM document
//! (SEC1 `EC PRIVATE KEY` or PKCS#8 `PRIVATE KEY`).

use alloy::signers::local::PrivateKeySigner;
use k256::SecretKey;

use super::client::{LedgerError, RegistryClient};

/// Parse a private key from PEM format to hex string.
///
/// # Returns
/// * `Ok(String)` - Hex-encoded private key (64 characters, no 0x prefix)
/// * `Err(LedgerError)` - If PEM parsing fails
pub fn pem_to_hex(pem_bytes: &[u8]) -> Result<String, LedgerError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| LedgerError::InvalidPrivateKey(format!("Invalid UTF-8: {}", e)))?;

    let pem = pem::parse(pem_str)
        .map_err(|e| LedgerError::InvalidPrivateKey(format!("Invalid PEM: {}", e)))?;

    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
        .map_err(|e| LedgerError::InvalidPrivateKey(format!("Invalid key format: {}", e)))?;

    Ok(alloy::hex::encode(secret_key.to_bytes()))
}

fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}

/// Create a registrar signer from configuration input, PEM or hex.
pub fn registrar_signer(raw: &str) -> Result<PrivateKeySigner, LedgerError> {
    if raw.contains("-----BEGIN") {
        let hex_key = pem_to_hex(raw.as_bytes())?;
        RegistryClient::create_signer(&hex_key)
    } else {
        RegistryClient::create_signer(raw)
    }
}
