// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory registry used by tests.
//!
//! Mirrors the contract's own enforcement (conflicting binds and writes from
//! unauthorized registrars revert) so tests can tell workflow-level checks
//! apart from ledger-level ones via the call counters.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use super::client::LedgerError;
use super::ledger::LedgerClient;
use super::types::{DeathRecord, TxConfirmation};

/// Timestamp assigned to the first recorded death.
pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

#[derive(Default)]
struct RegistryState {
    wallet_by_nric: HashMap<String, Address>,
    nric_by_wallet: HashMap<Address, String>,
    registrars: HashSet<Address>,
    token_by_nric: HashMap<String, U256>,
    records: HashMap<U256, DeathRecord>,
    next_token: u64,
    block: u64,
    reads: usize,
    writes: usize,
    fail_writes_with: Option<LedgerError>,
    /// Reads beyond the first `n` fail with the given error.
    fail_reads_after: Option<(usize, LedgerError)>,
    offline: bool,
}

pub struct InMemoryLedger {
    registrar: Address,
    state: Mutex<RegistryState>,
}

impl InMemoryLedger {
    /// A registry whose signing registrar is already authorized.
    pub fn authorized(registrar: Address) -> Self {
        let ledger = Self::unauthorized(registrar);
        ledger.authorize(registrar);
        ledger
    }

    pub fn unauthorized(registrar: Address) -> Self {
        Self {
            registrar,
            state: Mutex::new(RegistryState {
                next_token: 1,
                block: 100,
                ..RegistryState::default()
            }),
        }
    }

    pub fn authorize(&self, wallet: Address) {
        self.state.lock().unwrap().registrars.insert(wallet);
    }

    pub fn revoke(&self, wallet: Address) {
        self.state.lock().unwrap().registrars.remove(&wallet);
    }

    /// Seed a binding directly, bypassing authorization.
    pub fn seed_binding(&self, nric: &str, wallet: Address) {
        let mut state = self.state.lock().unwrap();
        state.wallet_by_nric.insert(nric.to_string(), wallet);
        state.nric_by_wallet.insert(wallet, nric.to_string());
    }

    /// Make every subsequent write fail with `error`.
    pub fn fail_writes_with(&self, error: LedgerError) {
        self.state.lock().unwrap().fail_writes_with = Some(error);
    }

    /// Make every subsequent contract read fail with `error`.
    pub fn fail_reads_with(&self, error: LedgerError) {
        self.fail_reads_after(0, error);
    }

    /// Let the next `reads` contract reads succeed, then fail with `error`.
    pub fn fail_reads_after(&self, reads: usize, error: LedgerError) {
        let mut state = self.state.lock().unwrap();
        let threshold = state.reads + reads;
        state.fail_reads_after = Some((threshold, error));
    }

    /// Make the node unreachable for chain-head queries.
    pub fn go_offline(&self) {
        self.state.lock().unwrap().offline = true;
    }

    pub fn reads(&self) -> usize {
        self.state.lock().unwrap().reads
    }

    pub fn writes(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    pub fn bound_wallet(&self, nric: &str) -> Option<Address> {
        self.state.lock().unwrap().wallet_by_nric.get(nric).copied()
    }

    fn read<T>(&self, f: impl FnOnce(&RegistryState) -> T) -> Result<T, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        if let Some((threshold, error)) = &state.fail_reads_after {
            if state.reads > *threshold {
                return Err(error.clone());
            }
        }
        Ok(f(&state))
    }

    fn write(
        &self,
        f: impl FnOnce(&mut RegistryState) -> Result<(), LedgerError>,
    ) -> Result<TxConfirmation, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.writes += 1;
        if let Some(error) = state.fail_writes_with.clone() {
            return Err(error);
        }
        if !state.registrars.contains(&self.registrar) {
            return Err(LedgerError::TransactionRejected(
                "execution reverted: not an authorized registrar".into(),
            ));
        }
        f(&mut state)?;
        state.block += 1;
        Ok(TxConfirmation {
            transaction_hash: format!("0x{:064x}", state.writes),
            block_number: state.block,
        })
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    fn registrar(&self) -> Address {
        self.registrar
    }

    async fn wallet_for_nric(&self, nric: &str) -> Result<Option<Address>, LedgerError> {
        self.read(|s| s.wallet_by_nric.get(nric).copied())
    }

    async fn nric_for_wallet(&self, wallet: Address) -> Result<Option<String>, LedgerError> {
        self.read(|s| s.nric_by_wallet.get(&wallet).cloned())
    }

    async fn is_authorized_registrar(&self, wallet: Address) -> Result<bool, LedgerError> {
        self.read(|s| s.registrars.contains(&wallet))
    }

    async fn is_deceased(&self, nric: &str) -> Result<bool, LedgerError> {
        self.read(|s| s.token_by_nric.contains_key(nric))
    }

    async fn token_for_nric(&self, nric: &str) -> Result<U256, LedgerError> {
        self.read(|s| s.token_by_nric.get(nric).copied().unwrap_or(U256::ZERO))
    }

    async fn death_record(&self, token_id: U256) -> Result<DeathRecord, LedgerError> {
        self.read(|s| s.records.get(&token_id).cloned())?
            .ok_or_else(|| LedgerError::Network("execution reverted: unknown token".into()))
    }

    async fn block_number(&self) -> Result<u64, LedgerError> {
        self.read(|s| (!s.offline).then_some(s.block))?
            .ok_or_else(|| LedgerError::Network("connection refused".into()))
    }

    async fn bind_identity(
        &self,
        nric: &str,
        wallet: Address,
    ) -> Result<TxConfirmation, LedgerError> {
        self.write(|s| {
            if s.wallet_by_nric.contains_key(nric) || s.nric_by_wallet.contains_key(&wallet) {
                return Err(LedgerError::TransactionRejected(
                    "execution reverted: already bound".into(),
                ));
            }
            s.wallet_by_nric.insert(nric.to_string(), wallet);
            s.nric_by_wallet.insert(wallet, nric.to_string());
            Ok(())
        })
    }

    async fn record_death(
        &self,
        nric: &str,
        metadata_cid: &str,
    ) -> Result<TxConfirmation, LedgerError> {
        self.write(|s| {
            if !s.wallet_by_nric.contains_key(nric) {
                return Err(LedgerError::TransactionRejected(
                    "execution reverted: nric not registered".into(),
                ));
            }
            let token_id = U256::from(s.next_token);
            let record = DeathRecord {
                metadata_cid: metadata_cid.to_string(),
                timestamp: GENESIS_TIMESTAMP + s.next_token,
            };
            s.next_token += 1;
            s.token_by_nric.insert(nric.to_string(), token_id);
            s.records.insert(token_id, record);
            Ok(())
        })
    }
}
