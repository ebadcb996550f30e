// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the gateway. Field names on the wire are
//! camelCase to match the registrar front-end; a few names (`metadataCID`,
//! `tokenURI`) keep the spelling used by the registry contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::{DeathRecord, TxConfirmation};
use crate::workflow::{DeathReceipt, IdentityStatus};

// =============================================================================
// Evidence
// =============================================================================

/// Multipart body of `POST /upload`.
#[derive(Debug, ToSchema)]
pub struct EvidenceUploadForm {
    /// PDF, JPEG, PNG or JSON document.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Response to an evidence upload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Content identifier of the stored document.
    pub cid: String,
}

// =============================================================================
// Bind Identity
// =============================================================================

/// Request to bind an NRIC to a wallet.
///
/// Both fields are optional at the parsing stage so that missing values are
/// reported with the gateway's own validation errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BindIdentityRequest {
    /// National identity number.
    pub nric: Option<String>,
    /// Wallet address (0x + 40 hex characters).
    pub wallet: Option<String>,
}

/// Confirmed bind transaction.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BindIdentityResponse {
    pub message: String,
    pub transaction_hash: String,
    pub block_number: u64,
}

impl From<TxConfirmation> for BindIdentityResponse {
    fn from(confirmation: TxConfirmation) -> Self {
        Self {
            message: "Identity bound successfully".to_string(),
            transaction_hash: confirmation.transaction_hash,
            block_number: confirmation.block_number,
        }
    }
}

// =============================================================================
// Record Death
// =============================================================================

/// JSON form of a death registration.
///
/// Multipart submissions carry the same fields plus an optional `file` part.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RecordDeathRequest {
    /// National identity number.
    pub nric: Option<String>,
    /// CID of evidence already in the store.
    #[serde(rename = "metadataCID")]
    pub metadata_cid: Option<String>,
}

/// Multipart form of a death registration.
#[derive(Debug, ToSchema)]
pub struct RecordDeathForm {
    pub nric: String,
    /// CID of evidence already in the store; `file` is ignored when set.
    #[schema(rename = "metadataCID")]
    pub metadata_cid: Option<String>,
    /// Evidence to upload when no CID is supplied.
    #[schema(value_type = Option<String>, format = Binary)]
    pub file: Option<Vec<u8>>,
}

/// Confirmed death registration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordDeathResponse {
    pub message: String,
    #[serde(rename = "metadataCID")]
    pub metadata_cid: String,
    pub transaction_hash: String,
    pub block_number: u64,
}

impl From<DeathReceipt> for RecordDeathResponse {
    fn from(receipt: DeathReceipt) -> Self {
        Self {
            message: "Death recorded and attestation minted".to_string(),
            metadata_cid: receipt.metadata_cid,
            transaction_hash: receipt.confirmation.transaction_hash,
            block_number: receipt.confirmation.block_number,
        }
    }
}

// =============================================================================
// Search
// =============================================================================

/// Death attestation details.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeathRecordView {
    #[serde(rename = "metadataCID")]
    pub metadata_cid: String,
    /// Unix timestamp (seconds).
    pub timestamp: u64,
    /// RFC 3339 rendering of `timestamp`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl From<DeathRecord> for DeathRecordView {
    fn from(record: DeathRecord) -> Self {
        let recorded_at = i64::try_from(record.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0));
        Self {
            metadata_cid: record.metadata_cid,
            timestamp: record.timestamp,
            recorded_at,
        }
    }
}

/// Current status of an identity.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityStatusResponse {
    pub nric: String,
    /// Bound wallet (EIP-55 checksummed).
    pub wallet: String,
    pub is_deceased: bool,
    /// Soul-bound token id as a decimal string; null while alive.
    pub token_id: Option<String>,
    pub record: Option<DeathRecordView>,
    /// `ipfs://<metadataCID>`; null while alive.
    #[serde(rename = "tokenURI")]
    pub token_uri: Option<String>,
}

impl From<IdentityStatus> for IdentityStatusResponse {
    fn from(status: IdentityStatus) -> Self {
        Self {
            nric: status.nric,
            wallet: status.wallet.to_checksum(None),
            is_deceased: status.is_deceased,
            token_id: status.token_id.map(|id| id.to_string()),
            record: status.record.map(DeathRecordView::from),
            token_uri: status.token_uri,
        }
    }
}
