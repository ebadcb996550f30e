// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scoped staging of evidence blobs on local disk.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use super::{EvidenceError, MediaType};

/// A blob written to a temporary file.
///
/// The file is removed when the value is dropped. Call [`StagedBlob::release`]
/// on the normal path to observe deletion errors.
#[derive(Debug)]
pub struct StagedBlob {
    file: NamedTempFile,
    len: u64,
    sha256: String,
}

impl StagedBlob {
    /// Write `bytes` to a fresh temporary file in `dir`.
    pub fn write(dir: &Path, media_type: MediaType, bytes: &[u8]) -> Result<Self, EvidenceError> {
        let mut file = tempfile::Builder::new()
            .prefix("evidence-")
            .suffix(media_type.extension())
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        Ok(Self {
            file,
            len: bytes.len() as u64,
            sha256: alloy::hex::encode(Sha256::digest(bytes)),
        })
    }

    /// [`StagedBlob::write`] on the blocking thread pool.
    pub async fn stage(
        dir: PathBuf,
        media_type: MediaType,
        bytes: Vec<u8>,
    ) -> Result<Self, EvidenceError> {
        tokio::task::spawn_blocking(move || Self::write(&dir, media_type, &bytes))
            .await
            .map_err(|e| EvidenceError::StagingIo(io::Error::other(e)))?
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Hex SHA-256 of the staged bytes.
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Delete the staged file, surfacing any I/O error.
    pub fn release(self) -> Result<(), EvidenceError> {
        self.file.close().map_err(EvidenceError::StagingIo)
    }

    /// [`StagedBlob::release`] on the blocking thread pool.
    pub async fn discard(self) -> Result<(), EvidenceError> {
        tokio::task::spawn_blocking(move || self.release())
            .await
            .map_err(|e| EvidenceError::StagingIo(io::Error::other(e)))?
    }
}
