// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity workflow errors.

use alloy::primitives::Address;

use crate::blockchain::LedgerError;
use crate::evidence::EvidenceError;

/// Error classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, caught before any external call
    Validation,
    /// Uniqueness or state invariant violation
    Conflict,
    /// Caller is not an authorized registrar
    Authorization,
    /// NRIC unknown to the ledger
    NotFound,
    /// Ledger or storage network failure
    Upstream,
}

/// Failure of a bind, record-death, search or upload operation.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("NRIC is required")]
    MissingNric,

    #[error("Invalid wallet address: {0}")]
    InvalidWallet(String),

    #[error("Either a metadata CID or an evidence file is required")]
    MissingEvidence,

    #[error("Invalid media type `{0}`: only PDF, JPEG, PNG and JSON are accepted")]
    InvalidMediaType(String),

    #[error("NRIC is already bound to wallet {existing_wallet}")]
    AlreadyBound { existing_wallet: Address },

    #[error("Wallet is already bound to another NRIC")]
    WalletAlreadyBound { existing_nric: String },

    #[error("Wallet {registrar} is not an authorized registrar")]
    NotAuthorized { registrar: Address },

    #[error("NRIC {nric} is not registered")]
    NricNotRegistered { nric: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Evidence(EvidenceError),

    #[error("{source} (evidence {orphaned_cid} was uploaded but is not referenced on-chain)")]
    WriteFailedAfterUpload {
        orphaned_cid: String,
        source: LedgerError,
    },
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::MissingNric
            | WorkflowError::InvalidWallet(_)
            | WorkflowError::MissingEvidence
            | WorkflowError::InvalidMediaType(_) => ErrorKind::Validation,
            WorkflowError::AlreadyBound { .. } | WorkflowError::WalletAlreadyBound { .. } => {
                ErrorKind::Conflict
            }
            WorkflowError::NotAuthorized { .. } => ErrorKind::Authorization,
            WorkflowError::NricNotRegistered { .. } => ErrorKind::NotFound,
            WorkflowError::Ledger(_)
            | WorkflowError::Evidence(_)
            | WorkflowError::WriteFailedAfterUpload { .. } => ErrorKind::Upstream,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::MissingNric => "MissingNric",
            WorkflowError::InvalidWallet(_) => "InvalidWallet",
            WorkflowError::MissingEvidence => "MissingEvidence",
            WorkflowError::InvalidMediaType(_) => "InvalidMediaType",
            WorkflowError::AlreadyBound { .. } => "AlreadyBound",
            WorkflowError::WalletAlreadyBound { .. } => "WalletAlreadyBound",
            WorkflowError::NotAuthorized { .. } => "NotAuthorized",
            WorkflowError::NricNotRegistered { .. } => "NricNotRegistered",
            WorkflowError::Ledger(LedgerError::TransactionRejected(_)) => "TransactionRejected",
            WorkflowError::Ledger(LedgerError::TransactionTimeout(_)) => "TransactionTimeout",
            WorkflowError::Ledger(_) => "LedgerUnavailable",
            WorkflowError::Evidence(EvidenceError::StagingIo(_)) => "StagingIoError",
            WorkflowError::Evidence(_) => "StorageUnavailable",
            WorkflowError::WriteFailedAfterUpload { .. } => "WriteFailedAfterUpload",
        }
    }
}

impl From<EvidenceError> for WorkflowError {
    fn from(e: EvidenceError) -> Self {
        match e {
            EvidenceError::InvalidMediaType(mime) => WorkflowError::InvalidMediaType(mime),
            other => WorkflowError::Evidence(other),
        }
    }
}
