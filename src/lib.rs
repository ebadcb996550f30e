// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity Registry Gateway - NRIC registrar service
//!
//! This crate exposes an HTTP gateway over an on-chain identity registry.
//! Registrars bind national identity numbers (NRICs) to wallets and record
//! deaths, which mint soul-bound attestations pointing at evidence held in a
//! content-addressed store.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `blockchain` - Identity registry contract client
//! - `evidence` - Evidence staging and upload
//! - `workflow` - Validation, authorization and orchestration

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod evidence;
pub mod models;
pub mod state;
pub mod tls;
pub mod workflow;
