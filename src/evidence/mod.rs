// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Evidence Store
//!
//! Off-chain storage for death certificates and supporting documents. Blobs
//! are uploaded to a content-addressed store and referenced on-chain only by
//! the returned CID.
//!
//! ## Upload lifecycle
//!
//! 1. The declared media type is checked against the allow-list (no I/O yet).
//! 2. The bytes are staged in a temporary file owned by the upload call.
//! 3. The staged file is streamed to the store, which answers with a CID.
//! 4. The staged file is deleted, whatever the outcome of step 3.
//!
//! Uploads are never cached, deduplicated or retried.

use std::io;

use async_trait::async_trait;

pub mod http_store;
pub mod staging;

#[cfg(test)]
pub mod fake;

pub use http_store::{HttpEvidenceStore, StorageCredentials};
pub use staging::StagedBlob;

/// Media types accepted as evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Pdf,
    Jpeg,
    Png,
    Json,
}

impl MediaType {
    /// Resolve a MIME type string (parameters such as `charset` are ignored).
    pub fn from_mime(mime: &str) -> Option<MediaType> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "application/pdf" => Some(MediaType::Pdf),
            "image/jpeg" | "image/jpg" => Some(MediaType::Jpeg),
            "image/png" => Some(MediaType::Png),
            "application/json" => Some(MediaType::Json),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Pdf => "application/pdf",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MediaType::Pdf => ".pdf",
            MediaType::Jpeg => ".jpg",
            MediaType::Png => ".png",
            MediaType::Json => ".json",
        }
    }
}

/// An uploaded evidence document, as received from the client.
#[derive(Debug, Clone)]
pub struct EvidenceBlob {
    /// Declared MIME type
    pub content_type: String,
    /// Original file name, if the client sent one
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

impl EvidenceBlob {
    pub fn new(content_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            file_name: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Validate the declared content type against the allow-list.
    pub fn media_type(&self) -> Result<MediaType, EvidenceError> {
        MediaType::from_mime(&self.content_type)
            .ok_or_else(|| EvidenceError::InvalidMediaType(self.content_type.clone()))
    }
}

/// Errors that can occur while storing evidence.
#[derive(Debug, thiserror::Error)]
pub enum EvidenceError {
    #[error("Invalid media type `{0}`: only PDF, JPEG, PNG and JSON are accepted")]
    InvalidMediaType(String),

    #[error("Evidence store unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Evidence staging failed: {0}")]
    StagingIo(#[from] io::Error),
}

/// Content-addressed store for evidence blobs.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Upload a blob and return its CID.
    async fn upload(&self, blob: EvidenceBlob) -> Result<String, EvidenceError>;
}
