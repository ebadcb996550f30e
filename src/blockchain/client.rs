// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity registry client for EVM chains.

use std::time::Duration;

use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, U256},
    providers::{
        fillers::{
            BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller,
            WalletFiller,
        },
        Identity, PendingTransactionBuilder, PendingTransactionError, Provider, ProviderBuilder,
        RootProvider, WatchTxError,
    },
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;

use super::ledger::LedgerClient;
use super::registry::IIdentityRegistry;
use super::types::*;

/// HTTP provider type with all fillers and a signing wallet.
type SigningProvider = FillProvider<
    JoinFill<
        JoinFill<
            Identity,
            JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
        >,
        WalletFiller<EthereumWallet>,
    >,
    RootProvider<Ethereum>,
>;

/// Identity registry client backed by an alloy provider.
pub struct RegistryClient {
    contract: IIdentityRegistry::IIdentityRegistryInstance<SigningProvider>,
    registrar: Address,
    confirmation_timeout: Duration,
}

impl RegistryClient {
    /// Connect to the registry, signing writes with the given registrar key.
    pub fn new(config: &RegistryConfig, signer: PrivateKeySigner) -> Result<Self, LedgerError> {
        let url: url::Url = config
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| LedgerError::InvalidRpcUrl(e.to_string()))?;

        let contract_address = parse_address(&config.contract_address)
            .map_err(|e| LedgerError::InvalidAddress(format!("contract address: {e}")))?;

        let registrar = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url);

        Ok(Self {
            contract: IIdentityRegistry::new(contract_address, provider),
            registrar,
            confirmation_timeout: config.confirmation_timeout,
        })
    }

    /// Create a signer from a hex-encoded private key (with or without 0x).
    pub fn create_signer(private_key_hex: &str) -> Result<PrivateKeySigner, LedgerError> {
        let trimmed = private_key_hex.trim();
        let key_bytes = alloy::hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
            .map_err(|e| LedgerError::InvalidPrivateKey(e.to_string()))?;

        PrivateKeySigner::from_slice(&key_bytes)
            .map_err(|e| LedgerError::InvalidPrivateKey(e.to_string()))
    }

    /// Wait for a submitted write to be mined.
    async fn confirm(
        &self,
        pending: PendingTransactionBuilder<Ethereum>,
    ) -> Result<TxConfirmation, LedgerError> {
        let tx_hash = format!("{:?}", pending.tx_hash());
        tracing::debug!(tx_hash = %tx_hash, "Registry write submitted, awaiting receipt");

        let receipt = pending
            .with_timeout(Some(self.confirmation_timeout))
            .get_receipt()
            .await
            .map_err(|e| match e {
                PendingTransactionError::TxWatcher(WatchTxError::Timeout) => {
                    LedgerError::TransactionTimeout(tx_hash.clone())
                }
                other => LedgerError::Network(format!("Failed to get receipt: {other}")),
            })?;

        if !receipt.status() {
            return Err(LedgerError::TransactionRejected(format!(
                "transaction {tx_hash} reverted"
            )));
        }

        Ok(TxConfirmation {
            transaction_hash: format!("{:?}", receipt.transaction_hash),
            block_number: receipt.block_number.unwrap_or(0),
        })
    }
}

#[async_trait]
impl LedgerClient for RegistryClient {
    fn registrar(&self) -> Address {
        self.registrar
    }

    async fn wallet_for_nric(&self, nric: &str) -> Result<Option<Address>, LedgerError> {
        let wallet = self
            .contract
            .getWalletForNric(nric.to_string())
            .call()
            .await
            .map_err(read_error)?;
        Ok(bound_wallet(wallet))
    }

    async fn nric_for_wallet(&self, wallet: Address) -> Result<Option<String>, LedgerError> {
        let nric = self
            .contract
            .getNricForWallet(wallet)
            .call()
            .await
            .map_err(read_error)?;
        Ok(bound_nric(nric))
    }

    async fn is_authorized_registrar(&self, wallet: Address) -> Result<bool, LedgerError> {
        self.contract
            .authorizedRegistrars(wallet)
            .call()
            .await
            .map_err(read_error)
    }

    async fn is_deceased(&self, nric: &str) -> Result<bool, LedgerError> {
        self.contract
            .isDeceased(nric.to_string())
            .call()
            .await
            .map_err(read_error)
    }

    async fn token_for_nric(&self, nric: &str) -> Result<U256, LedgerError> {
        self.contract
            .getTokenByNric(nric.to_string())
            .call()
            .await
            .map_err(read_error)
    }

    async fn death_record(&self, token_id: U256) -> Result<DeathRecord, LedgerError> {
        let record = self
            .contract
            .getDeathRecord(token_id)
            .call()
            .await
            .map_err(read_error)?;

        Ok(DeathRecord {
            metadata_cid: record.metadataCID,
            timestamp: record.timestamp.saturating_to::<u64>(),
        })
    }

    async fn block_number(&self) -> Result<u64, LedgerError> {
        self.contract
            .provider()
            .get_block_number()
            .await
            .map_err(|e| LedgerError::Network(e.to_string()))
    }

    async fn bind_identity(
        &self,
        nric: &str,
        wallet: Address,
    ) -> Result<TxConfirmation, LedgerError> {
        let pending = self
            .contract
            .bindIdentity(nric.to_string(), wallet)
            .send()
            .await
            .map_err(send_error)?;
        self.confirm(pending).await
    }

    async fn record_death(
        &self,
        nric: &str,
        metadata_cid: &str,
    ) -> Result<TxConfirmation, LedgerError> {
        let pending = self
            .contract
            .recordDeath(nric.to_string(), metadata_cid.to_string())
            .send()
            .await
            .map_err(send_error)?;
        self.confirm(pending).await
    }
}

/// The registry reports an unbound NRIC as the zero address.
fn bound_wallet(wallet: Address) -> Option<Address> {
    (!wallet.is_zero()).then_some(wallet)
}

/// The registry reports an unbound wallet as the empty string.
fn bound_nric(nric: String) -> Option<String> {
    (!nric.is_empty()).then_some(nric)
}

fn read_error(e: alloy::contract::Error) -> LedgerError {
    LedgerError::Network(e.to_string())
}

/// Node-side refusals (reverts during estimation, nonce or funds errors)
/// come back as JSON-RPC error responses; anything else is transport.
fn send_error(e: alloy::contract::Error) -> LedgerError {
    match e {
        alloy::contract::Error::TransportError(err) if err.as_error_resp().is_none() => {
            LedgerError::Network(err.to_string())
        }
        other => LedgerError::TransactionRejected(other.to_string()),
    }
}

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),

    #[error("Transaction {0} not confirmed before timeout; it may still be mined")]
    TransactionTimeout(String),
}
