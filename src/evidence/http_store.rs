// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP upload client for the content-addressed evidence store.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Deserialize;
use tracing::info;

use super::{EvidenceBlob, EvidenceError, EvidenceStore, MediaType, StagedBlob};

/// Default request timeout for uploads.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(60);

const DELEGATION_PROOF_HEADER: &str = "X-Delegation-Proof";
const SPACE_HEADER: &str = "X-Space-DID";

/// Credential triple for the storage network.
#[derive(Debug, Clone)]
pub struct StorageCredentials {
    /// Agent signing key
    pub key: String,
    /// Delegation proof granting the agent upload rights
    pub proof: String,
    /// Target space identifier
    pub space_did: String,
}

#[derive(Debug, Deserialize)]
struct UploadReceipt {
    #[serde(alias = "Hash")]
    cid: String,
}

/// Evidence store that uploads through an HTTP gateway.
#[derive(Debug, Clone)]
pub struct HttpEvidenceStore {
    upload_url: String,
    credentials: StorageCredentials,
    staging_dir: PathBuf,
    http: Client,
}

impl HttpEvidenceStore {
    pub fn new(
        api_base_url: &str,
        credentials: StorageCredentials,
        staging_dir: PathBuf,
        timeout: Duration,
    ) -> Result<Self, EvidenceError> {
        let http = Client::builder().timeout(timeout).build().map_err(|e| {
            EvidenceError::StorageUnavailable(format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            upload_url: format!("{}/upload", api_base_url.trim_end_matches('/')),
            credentials,
            staging_dir,
            http,
        })
    }

    /// Stream a staged blob to the store and read back its CID.
    async fn submit(
        &self,
        staged: &StagedBlob,
        media_type: MediaType,
        file_name: &str,
    ) -> Result<String, EvidenceError> {
        let file = tokio::fs::File::open(staged.path()).await?;
        let part = multipart::Part::stream_with_length(reqwest::Body::from(file), staged.len())
            .file_name(file_name.to_string())
            .mime_str(media_type.mime())
            .map_err(|e| EvidenceError::StorageUnavailable(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(&self.upload_url)
            .bearer_auth(&self.credentials.key)
            .header(DELEGATION_PROOF_HEADER, &self.credentials.proof)
            .header(SPACE_HEADER, &self.credentials.space_did)
            .multipart(form)
            .send()
            .await
            .map_err(|e| EvidenceError::StorageUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EvidenceError::StorageUnavailable(format!(
                "store returned {status}: {body}"
            )));
        }

        let receipt = response.json::<UploadReceipt>().await.map_err(|e| {
            EvidenceError::StorageUnavailable(format!("invalid upload response: {e}"))
        })?;

        if receipt.cid.trim().is_empty() {
            return Err(EvidenceError::StorageUnavailable(
                "upload response carried an empty CID".to_string(),
            ));
        }
        Ok(receipt.cid)
    }
}

#[async_trait]
impl EvidenceStore for HttpEvidenceStore {
    async fn upload(&self, blob: EvidenceBlob) -> Result<String, EvidenceError> {
        let media_type = blob.media_type()?;
        let file_name = blob
            .file_name
            .clone()
            .unwrap_or_else(|| format!("evidence{}", media_type.extension()));

        let staged = StagedBlob::stage(self.staging_dir.clone(), media_type, blob.bytes).await?;

        let submitted = self.submit(&staged, media_type, &file_name).await;
        let sha256 = staged.sha256().to_string();
        let size = staged.len();
        let released = staged.discard().await;

        let cid = submitted?;
        released?;

        info!(
            cid = %cid,
            sha256 = %sha256,
            size,
            media_type = media_type.mime(),
            "Evidence uploaded"
        );
        Ok(cid)
    }
}
