// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity Workflow
//!
//! Ordered validation and authorization checks in front of every registry
//! write, plus the read pipeline that reconstructs an identity's status.
//!
//! ## Consistency model
//!
//! The ledger is the only source of truth; nothing here is cached. The
//! read-then-write checks in [`IdentityWorkflow::bind`] and
//! [`IdentityWorkflow::record_death`] fail fast on conflicts but cannot
//! exclude a concurrent writer slipping in between the read and the write.
//! The registry contract is the final arbiter for such races.
//!
//! Registrar authorization is re-read for every mutating call and never
//! remembered between calls.
//!
//! ## Known gap
//!
//! `record_death` does not check `isDeceased` before writing. Duplicate death
//! records are left to the contract's own enforcement, if any.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use tracing::{info, warn};

use crate::blockchain::{parse_address, DeathRecord, LedgerClient, TxConfirmation};
use crate::evidence::{EvidenceBlob, EvidenceStore};

mod error;

pub use error::{ErrorKind, WorkflowError};

/// Inputs to a death registration.
#[derive(Debug, Clone, Default)]
pub struct DeathRegistration {
    pub nric: String,
    /// CID of evidence already in the store; takes precedence over `evidence`
    pub metadata_cid: Option<String>,
    /// Evidence to upload when no CID is supplied
    pub evidence: Option<EvidenceBlob>,
}

/// Result of a confirmed death registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeathReceipt {
    pub confirmation: TxConfirmation,
    /// CID written on-chain
    pub metadata_cid: String,
}

/// Current status of an identity as reconstructed from the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityStatus {
    pub nric: String,
    pub wallet: Address,
    pub is_deceased: bool,
    pub token_id: Option<U256>,
    pub record: Option<DeathRecord>,
    pub token_uri: Option<String>,
}

enum EvidenceSource {
    Cid(String),
    Blob(EvidenceBlob),
}

/// Identity workflow engine over a ledger and an evidence store.
pub struct IdentityWorkflow {
    ledger: Arc<dyn LedgerClient>,
    evidence: Arc<dyn EvidenceStore>,
}

impl IdentityWorkflow {
    pub fn new(ledger: Arc<dyn LedgerClient>, evidence: Arc<dyn EvidenceStore>) -> Self {
        Self { ledger, evidence }
    }

    /// Wallet that signs registry writes.
    pub fn registrar(&self) -> Address {
        self.ledger.registrar()
    }

    /// Latest block of the ledger, for readiness probing.
    pub async fn chain_head(&self) -> Result<u64, WorkflowError> {
        Ok(self.ledger.block_number().await?)
    }

    /// Store an evidence document and return its CID.
    pub async fn upload_evidence(&self, blob: EvidenceBlob) -> Result<String, WorkflowError> {
        Ok(self.evidence.upload(blob).await?)
    }

    /// Bind `nric` to `wallet`.
    ///
    /// Checks, in order of precedence: input validity, existing NRIC binding,
    /// existing wallet binding, registrar authorization. The three ledger
    /// reads are issued concurrently.
    pub async fn bind(&self, nric: &str, wallet: &str) -> Result<TxConfirmation, WorkflowError> {
        let nric = normalize_nric(nric)?;
        let wallet = parse_wallet(wallet)?;
        let registrar = self.ledger.registrar();

        let (existing_wallet, existing_nric, authorized) = tokio::try_join!(
            self.ledger.wallet_for_nric(&nric),
            self.ledger.nric_for_wallet(wallet),
            self.ledger.is_authorized_registrar(registrar),
        )?;

        if let Some(existing_wallet) = existing_wallet {
            return Err(WorkflowError::AlreadyBound { existing_wallet });
        }
        if let Some(existing_nric) = existing_nric {
            return Err(WorkflowError::WalletAlreadyBound { existing_nric });
        }
        if !authorized {
            return Err(WorkflowError::NotAuthorized { registrar });
        }

        let confirmation = self.ledger.bind_identity(&nric, wallet).await?;
        info!(
            nric = %nric,
            wallet = %wallet,
            tx_hash = %confirmation.transaction_hash,
            block = confirmation.block_number,
            "Identity bound"
        );
        Ok(confirmation)
    }

    /// Record a death against a bound NRIC.
    ///
    /// Authorization and registration are verified before any evidence is
    /// uploaded, so rejected requests never leave blobs in the store. If the
    /// ledger write fails after an upload, the uploaded CID is reported in
    /// [`WorkflowError::WriteFailedAfterUpload`]; it is not deleted.
    pub async fn record_death(
        &self,
        registration: DeathRegistration,
    ) -> Result<DeathReceipt, WorkflowError> {
        let nric = normalize_nric(&registration.nric)?;

        let supplied_cid = registration
            .metadata_cid
            .map(|cid| cid.trim().to_string())
            .filter(|cid| !cid.is_empty());
        let source = match (supplied_cid, registration.evidence) {
            (Some(cid), _) => EvidenceSource::Cid(cid),
            (None, Some(blob)) => {
                blob.media_type()?;
                EvidenceSource::Blob(blob)
            }
            (None, None) => return Err(WorkflowError::MissingEvidence),
        };

        let registrar = self.ledger.registrar();
        let (authorized, bound_wallet) = tokio::try_join!(
            self.ledger.is_authorized_registrar(registrar),
            self.ledger.wallet_for_nric(&nric),
        )?;
        if !authorized {
            return Err(WorkflowError::NotAuthorized { registrar });
        }
        if bound_wallet.is_none() {
            return Err(WorkflowError::NricNotRegistered { nric });
        }

        let (metadata_cid, uploaded) = match source {
            EvidenceSource::Cid(cid) => (cid, false),
            EvidenceSource::Blob(blob) => (self.evidence.upload(blob).await?, true),
        };

        let confirmation = match self.ledger.record_death(&nric, &metadata_cid).await {
            Ok(confirmation) => confirmation,
            Err(source) if uploaded => {
                warn!(
                    nric = %nric,
                    cid = %metadata_cid,
                    error = %source,
                    "Death record write failed after evidence upload"
                );
                return Err(WorkflowError::WriteFailedAfterUpload {
                    orphaned_cid: metadata_cid,
                    source,
                });
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            nric = %nric,
            cid = %metadata_cid,
            tx_hash = %confirmation.transaction_hash,
            block = confirmation.block_number,
            "Death recorded"
        );
        Ok(DeathReceipt {
            confirmation,
            metadata_cid,
        })
    }

    /// Reconstruct the status of `nric` from the ledger.
    pub async fn search(&self, nric: &str) -> Result<IdentityStatus, WorkflowError> {
        let nric = normalize_nric(nric)?;

        let Some(wallet) = self.ledger.wallet_for_nric(&nric).await? else {
            return Err(WorkflowError::NricNotRegistered { nric });
        };

        if !self.ledger.is_deceased(&nric).await? {
            return Ok(IdentityStatus {
                nric,
                wallet,
                is_deceased: false,
                token_id: None,
                record: None,
                token_uri: None,
            });
        }

        let token_id = self.ledger.token_for_nric(&nric).await?;
        let record = self.ledger.death_record(token_id).await?;
        let token_uri = format!("ipfs://{}", record.metadata_cid);

        Ok(IdentityStatus {
            nric,
            wallet,
            is_deceased: true,
            token_id: Some(token_id),
            record: Some(record),
            token_uri: Some(token_uri),
        })
    }
}

fn normalize_nric(raw: &str) -> Result<String, WorkflowError> {
    let nric = raw.trim();
    if nric.is_empty() {
        return Err(WorkflowError::MissingNric);
    }
    Ok(nric.to_string())
}

fn parse_wallet(raw: &str) -> Result<Address, WorkflowError> {
    if raw.trim().is_empty() {
        return Err(WorkflowError::InvalidWallet("wallet is required".to_string()));
    }
    let wallet = parse_address(raw).map_err(|e| WorkflowError::InvalidWallet(e.to_string()))?;
    if wallet.is_zero() {
        return Err(WorkflowError::InvalidWallet(
            "the zero address cannot be bound".to_string(),
        ));
    }
    Ok(wallet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::fake::{InMemoryLedger, GENESIS_TIMESTAMP};
    use crate::blockchain::LedgerError;
    use crate::evidence::fake::InMemoryEvidenceStore;

    const NRIC: &str = "S1234567A";
    const WALLET: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const OTHER_WALLET: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
    const REGISTRAR: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";

    struct Harness {
        ledger: Arc<InMemoryLedger>,
        store: Arc<InMemoryEvidenceStore>,
        workflow: IdentityWorkflow,
    }

    fn harness(ledger: InMemoryLedger) -> Harness {
        let ledger = Arc::new(ledger);
        let store = Arc::new(InMemoryEvidenceStore::new());
        let workflow = IdentityWorkflow::new(ledger.clone(), store.clone());
        Harness {
            ledger,
            store,
            workflow,
        }
    }

    fn addr(raw: &str) -> Address {
        parse_address(raw).unwrap()
    }

    fn authorized() -> Harness {
        harness(InMemoryLedger::authorized(addr(REGISTRAR)))
    }

    fn pdf() -> EvidenceBlob {
        EvidenceBlob::new("application/pdf", b"%PDF-1.7 death certificate".to_vec())
            .with_file_name("certificate.pdf")
    }

    fn death_with_blob(nric: &str) -> DeathRegistration {
        DeathRegistration {
            nric: nric.to_string(),
            metadata_cid: None,
            evidence: Some(pdf()),
        }
    }

    #[tokio::test]
    async fn bind_then_search_shows_living_identity() {
        let h = authorized();

        let confirmation = h.workflow.bind(NRIC, WALLET).await.unwrap();
        assert!(confirmation.transaction_hash.starts_with("0x"));

        let status = h.workflow.search(NRIC).await.unwrap();
        assert_eq!(status.wallet, addr(WALLET));
        assert!(!status.is_deceased);
        assert_eq!(status.token_id, None);
        assert_eq!(status.record, None);
        assert_eq!(status.token_uri, None);
    }

    #[tokio::test]
    async fn rebinding_nric_conflicts_and_keeps_original() {
        let h = authorized();
        h.workflow.bind(NRIC, WALLET).await.unwrap();

        let err = h.workflow.bind(NRIC, OTHER_WALLET).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(matches!(
            err,
            WorkflowError::AlreadyBound { existing_wallet } if existing_wallet == addr(WALLET)
        ));
        assert_eq!(h.ledger.bound_wallet(NRIC), Some(addr(WALLET)));
        assert_eq!(h.ledger.writes(), 1);
    }

    #[tokio::test]
    async fn binding_a_wallet_twice_conflicts() {
        let h = authorized();
        h.workflow.bind(NRIC, WALLET).await.unwrap();

        let err = h.workflow.bind("T7654321B", WALLET).await.unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::WalletAlreadyBound { ref existing_nric } if existing_nric == NRIC
        ));
        assert_eq!(h.ledger.bound_wallet("T7654321B"), None);
    }

    #[tokio::test]
    async fn bind_rejects_malformed_and_zero_wallets_without_reads() {
        let h = authorized();

        for wallet in [
            "",
            "0x1234",
            "not-an-address",
            "0x0000000000000000000000000000000000000000",
        ] {
            let err = h.workflow.bind(NRIC, wallet).await.unwrap_err();
            assert!(
                matches!(err, WorkflowError::InvalidWallet(_)),
                "{wallet}: {err:?}"
            );
        }
        assert_eq!(h.ledger.reads(), 0);
    }

    #[tokio::test]
    async fn bind_requires_nric() {
        let h = authorized();
        let err = h.workflow.bind("   ", WALLET).await.unwrap_err();
        assert!(matches!(err, WorkflowError::MissingNric));
    }

    #[tokio::test]
    async fn bind_by_unauthorized_registrar_is_rejected_before_write() {
        let h = harness(InMemoryLedger::unauthorized(addr(REGISTRAR)));

        let err = h.workflow.bind(NRIC, WALLET).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(h.ledger.writes(), 0);
    }

    #[tokio::test]
    async fn conflict_takes_precedence_over_authorization() {
        let h = harness(InMemoryLedger::unauthorized(addr(REGISTRAR)));
        h.ledger.seed_binding(NRIC, addr(WALLET));

        let err = h.workflow.bind(NRIC, OTHER_WALLET).await.unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadyBound { .. }));
    }

    #[tokio::test]
    async fn authorization_is_rechecked_on_every_write() {
        let h = authorized();
        h.workflow.bind(NRIC, WALLET).await.unwrap();

        h.ledger.revoke(addr(REGISTRAR));
        let err = h
            .workflow
            .bind("T7654321B", OTHER_WALLET)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let err = h
            .workflow
            .record_death(death_with_blob(NRIC))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(h.ledger.writes(), 1);
    }

    #[tokio::test]
    async fn bind_surfaces_ledger_write_failures_verbatim() {
        let h = authorized();
        h.ledger
            .fail_writes_with(LedgerError::TransactionTimeout("0xabc".into()));

        let err = h.workflow.bind(NRIC, WALLET).await.unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::Ledger(LedgerError::TransactionTimeout(ref hash)) if hash == "0xabc"
        ));
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[tokio::test]
    async fn record_death_with_blob_uploads_and_mints() {
        let h = authorized();
        h.workflow.bind(NRIC, WALLET).await.unwrap();

        let receipt = h.workflow.record_death(death_with_blob(NRIC)).await.unwrap();

        let expected_cid = InMemoryEvidenceStore::cid_for(b"%PDF-1.7 death certificate");
        assert_eq!(receipt.metadata_cid, expected_cid);
        assert_eq!(h.store.upload_count(), 1);

        let status = h.workflow.search(NRIC).await.unwrap();
        assert!(status.is_deceased);
        assert_eq!(status.token_id, Some(U256::from(1)));
        assert_eq!(
            status.token_uri.as_deref(),
            Some(format!("ipfs://{expected_cid}").as_str())
        );
        assert_eq!(
            status.record,
            Some(DeathRecord {
                metadata_cid: expected_cid,
                timestamp: GENESIS_TIMESTAMP + 1,
            })
        );
    }

    #[tokio::test]
    async fn supplied_cid_wins_over_blob() {
        let h = authorized();
        h.workflow.bind(NRIC, WALLET).await.unwrap();

        let receipt = h
            .workflow
            .record_death(DeathRegistration {
                nric: NRIC.into(),
                metadata_cid: Some(" bafyexisting ".into()),
                evidence: Some(pdf()),
            })
            .await
            .unwrap();

        assert_eq!(receipt.metadata_cid, "bafyexisting");
        assert_eq!(h.store.upload_count(), 0);
    }

    #[tokio::test]
    async fn record_death_on_unbound_nric_is_not_found_without_write_or_upload() {
        let h = authorized();

        let err = h
            .workflow
            .record_death(death_with_blob(NRIC))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(h.ledger.writes(), 0);
        assert_eq!(h.store.upload_count(), 0);
    }

    #[tokio::test]
    async fn unauthorized_record_death_never_uploads() {
        let h = harness(InMemoryLedger::unauthorized(addr(REGISTRAR)));
        h.ledger.seed_binding(NRIC, addr(WALLET));

        let err = h
            .workflow
            .record_death(death_with_blob(NRIC))
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::NotAuthorized { registrar } if registrar == addr(REGISTRAR)));
        assert_eq!(h.store.upload_count(), 0);
        assert_eq!(h.ledger.writes(), 0);
    }

    #[tokio::test]
    async fn record_death_validates_input_before_reading_ledger() {
        let h = authorized();

        let err = h
            .workflow
            .record_death(DeathRegistration::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::MissingNric));

        let err = h
            .workflow
            .record_death(DeathRegistration {
                nric: NRIC.into(),
                metadata_cid: Some("  ".into()),
                evidence: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::MissingEvidence));

        let err = h
            .workflow
            .record_death(DeathRegistration {
                nric: NRIC.into(),
                metadata_cid: None,
                evidence: Some(EvidenceBlob::new("text/plain", b"hi".to_vec())),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidMediaType(_)));

        assert_eq!(h.ledger.reads(), 0);
    }

    #[tokio::test]
    async fn failed_write_after_upload_reports_orphan() {
        let h = authorized();
        h.ledger.seed_binding(NRIC, addr(WALLET));
        h.ledger
            .fail_writes_with(LedgerError::TransactionRejected("reverted".into()));

        let err = h
            .workflow
            .record_death(death_with_blob(NRIC))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert!(matches!(
            err,
            WorkflowError::WriteFailedAfterUpload { ref orphaned_cid, .. }
                if *orphaned_cid == InMemoryEvidenceStore::cid_for(b"%PDF-1.7 death certificate")
        ));
        assert_eq!(h.store.upload_count(), 1);
    }

    #[tokio::test]
    async fn failed_write_with_supplied_cid_is_plain_ledger_error() {
        let h = authorized();
        h.ledger.seed_binding(NRIC, addr(WALLET));
        h.ledger
            .fail_writes_with(LedgerError::Network("connection reset".into()));

        let err = h
            .workflow
            .record_death(DeathRegistration {
                nric: NRIC.into(),
                metadata_cid: Some("bafyexisting".into()),
                evidence: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Ledger(LedgerError::Network(_))));
    }

    #[tokio::test]
    async fn storage_outage_fails_before_write() {
        let h = authorized();
        h.ledger.seed_binding(NRIC, addr(WALLET));
        h.store.go_offline();

        let err = h
            .workflow
            .record_death(death_with_blob(NRIC))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "StorageUnavailable");
        assert_eq!(h.ledger.writes(), 0);
    }

    fn death_with_cid(nric: &str, cid: &str) -> DeathRegistration {
        DeathRegistration {
            nric: nric.to_string(),
            metadata_cid: Some(cid.to_string()),
            evidence: None,
        }
    }

    #[tokio::test]
    async fn second_death_record_goes_straight_to_the_ledger() {
        let h = authorized();
        h.ledger.seed_binding(NRIC, addr(WALLET));

        let first = h
            .workflow
            .record_death(death_with_cid(NRIC, "bafyfirst"))
            .await
            .unwrap();
        let (reads, writes) = (h.ledger.reads(), h.ledger.writes());

        let second = h
            .workflow
            .record_death(death_with_cid(NRIC, "bafysecond"))
            .await
            .unwrap();

        // Only the registrar and binding reads; no isDeceased lookup.
        assert_eq!(h.ledger.reads(), reads + 2);
        assert_eq!(h.ledger.writes(), writes + 1);
        assert_eq!(second.metadata_cid, "bafysecond");
        assert_eq!(
            second.confirmation.block_number,
            first.confirmation.block_number + 1
        );
    }

    #[tokio::test]
    async fn ledger_rejection_of_a_second_death_is_passed_through() {
        let h = authorized();
        h.ledger.seed_binding(NRIC, addr(WALLET));
        h.workflow
            .record_death(death_with_cid(NRIC, "bafyfirst"))
            .await
            .unwrap();
        h.ledger.fail_writes_with(LedgerError::TransactionRejected(
            "execution reverted: already deceased".into(),
        ));

        let err = h
            .workflow
            .record_death(death_with_cid(NRIC, "bafysecond"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::Ledger(LedgerError::TransactionRejected(ref msg))
                if msg == "execution reverted: already deceased"
        ));
        assert_eq!(h.ledger.writes(), 2);
    }

    #[tokio::test]
    async fn failed_reads_abort_bind_before_write() {
        let h = authorized();
        h.ledger
            .fail_reads_with(LedgerError::Network("connection reset".into()));

        let err = h.workflow.bind(NRIC, WALLET).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(err.code(), "LedgerUnavailable");
        assert_eq!(h.ledger.writes(), 0);
    }

    #[tokio::test]
    async fn failed_reads_abort_record_death_before_upload_and_write() {
        let h = authorized();
        h.ledger.seed_binding(NRIC, addr(WALLET));

        for preceding_reads in [0, 1] {
            h.ledger.fail_reads_after(
                preceding_reads,
                LedgerError::Network("connection reset".into()),
            );

            let err = h
                .workflow
                .record_death(death_with_blob(NRIC))
                .await
                .unwrap_err();

            assert_eq!(err.kind(), ErrorKind::Upstream, "after {preceding_reads}");
            assert!(matches!(err, WorkflowError::Ledger(LedgerError::Network(_))));
        }
        assert_eq!(h.store.upload_count(), 0);
        assert_eq!(h.ledger.writes(), 0);
    }

    #[tokio::test]
    async fn search_fails_upstream_at_every_lookup_stage() {
        let h = authorized();
        h.ledger.seed_binding(NRIC, addr(WALLET));
        h.workflow
            .record_death(death_with_cid(NRIC, "bafycid"))
            .await
            .unwrap();

        // wallet, isDeceased, token id, death record
        for preceding_reads in 0..4 {
            h.ledger.fail_reads_after(
                preceding_reads,
                LedgerError::Network("connection reset".into()),
            );
            let before = h.ledger.reads();

            let err = h.workflow.search(NRIC).await.unwrap_err();

            assert_eq!(err.kind(), ErrorKind::Upstream, "after {preceding_reads}");
            assert_eq!(h.ledger.reads(), before + preceding_reads + 1);
        }
        assert_eq!(h.ledger.writes(), 1);
    }

    #[tokio::test]
    async fn search_unknown_nric_stops_after_first_read() {
        let h = authorized();

        let err = h.workflow.search("X0000000Z").await.unwrap_err();

        assert!(matches!(err, WorkflowError::NricNotRegistered { ref nric } if nric == "X0000000Z"));
        assert_eq!(h.ledger.reads(), 1);
    }

    #[tokio::test]
    async fn upload_evidence_rejects_plain_text() {
        let h = authorized();

        let err = h
            .workflow
            .upload_evidence(EvidenceBlob::new("text/plain", b"hello".to_vec()))
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::InvalidMediaType(_)));
        assert_eq!(h.store.upload_count(), 0);
    }

    #[tokio::test]
    async fn chain_head_reports_block_number() {
        let h = authorized();
        assert_eq!(h.workflow.chain_head().await.unwrap(), 100);
    }
}
