// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger client contract consumed by the identity workflow.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use super::client::LedgerError;
use super::types::{DeathRecord, TxConfirmation};

/// Typed access to the identity registry.
///
/// Unbound NRICs and wallets are reported as `None`; implementations are
/// responsible for translating the contract's zero-address and empty-string
/// sentinels. Writes resolve only once the transaction is mined and never
/// retry.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Wallet that signs registry writes.
    fn registrar(&self) -> Address;

    async fn wallet_for_nric(&self, nric: &str) -> Result<Option<Address>, LedgerError>;

    async fn nric_for_wallet(&self, wallet: Address) -> Result<Option<String>, LedgerError>;

    async fn is_authorized_registrar(&self, wallet: Address) -> Result<bool, LedgerError>;

    async fn is_deceased(&self, nric: &str) -> Result<bool, LedgerError>;

    async fn token_for_nric(&self, nric: &str) -> Result<U256, LedgerError>;

    async fn death_record(&self, token_id: U256) -> Result<DeathRecord, LedgerError>;

    /// Latest block number, used as a reachability probe.
    async fn block_number(&self) -> Result<u64, LedgerError>;

    async fn bind_identity(
        &self,
        nric: &str,
        wallet: Address,
    ) -> Result<TxConfirmation, LedgerError>;

    async fn record_death(
        &self,
        nric: &str,
        metadata_cid: &str,
    ) -> Result<TxConfirmation, LedgerError>;
}
