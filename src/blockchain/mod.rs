// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration for the on-chain identity registry.
//!
//! This module provides:
//! - The `LedgerClient` contract the identity workflow depends on
//! - An alloy-backed implementation talking to the registry over JSON-RPC
//! - Registrar key loading (hex or PEM)

pub mod client;
#[cfg(test)]
pub mod fake;
pub mod ledger;
pub mod registry;
pub mod signing;
pub mod types;

pub use client::{LedgerError, RegistryClient};
pub use ledger::LedgerClient;
pub use signing::registrar_signer;
pub use types::*;
