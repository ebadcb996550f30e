// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory evidence store used by tests.

use std::sync::Mutex;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{EvidenceBlob, EvidenceError, EvidenceStore};

#[derive(Default)]
pub struct InMemoryEvidenceStore {
    uploads: Mutex<Vec<EvidenceBlob>>,
    unavailable: Mutex<bool>,
}

impl InMemoryEvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent upload fail with `StorageUnavailable`.
    pub fn go_offline(&self) {
        *self.unavailable.lock().unwrap() = true;
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    /// Deterministic fake CID derived from content.
    pub fn cid_for(bytes: &[u8]) -> String {
        format!("bafy{}", &alloy::hex::encode(Sha256::digest(bytes))[..32])
    }
}

#[async_trait]
impl EvidenceStore for InMemoryEvidenceStore {
    async fn upload(&self, blob: EvidenceBlob) -> Result<String, EvidenceError> {
        blob.media_type()?;
        if *self.unavailable.lock().unwrap() {
            return Err(EvidenceError::StorageUnavailable("store offline".into()));
        }
        let cid = Self::cid_for(&blob.bytes);
        self.uploads.lock().unwrap().push(blob);
        Ok(cid)
    }
}
