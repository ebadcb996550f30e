// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Evidence upload endpoint and the multipart reader shared with
//! `POST /record-death`.

use std::collections::HashMap;

use axum::extract::{multipart::MultipartRejection, Multipart, State};
use axum::Json;

use crate::{
    error::ApiError,
    evidence::EvidenceBlob,
    models::{EvidenceUploadForm, UploadResponse},
    state::AppState,
    workflow::WorkflowError,
};

/// Multipart field carrying the evidence document.
pub const EVIDENCE_FIELD: &str = "file";

/// Content type assumed when a file part does not declare one.
const OCTET_STREAM: &str = "application/octet-stream";

/// Text fields and the evidence file of a multipart submission.
#[derive(Debug, Default)]
pub struct SubmittedForm {
    pub fields: HashMap<String, String>,
    pub file: Option<EvidenceBlob>,
}

impl SubmittedForm {
    pub fn field(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }
}

/// Drain a multipart body.
///
/// The first non-empty `file` part becomes the evidence; an empty file part
/// (a form submitted without choosing a file) counts as no file.
pub async fn read_form(mut multipart: Multipart) -> Result<SubmittedForm, ApiError> {
    let mut form = SubmittedForm::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == EVIDENCE_FIELD {
            let content_type = field.content_type().unwrap_or(OCTET_STREAM).to_owned();
            let file_name = field.file_name().map(str::to_owned);
            let bytes = field.bytes().await?;
            if bytes.is_empty() || form.file.is_some() {
                continue;
            }
            let blob = EvidenceBlob::new(content_type, bytes.to_vec());
            form.file = Some(match file_name.filter(|n| !n.is_empty()) {
                Some(file_name) => blob.with_file_name(file_name),
                None => blob,
            });
        } else {
            let value = field.text().await?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

/// Upload an evidence document.
///
/// Stores the `file` part in the content-addressed store and returns its
/// CID. Accepted types: PDF, JPEG, PNG and JSON.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "Evidence",
    request_body(content = EvidenceUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Evidence stored", body = UploadResponse),
        (status = 400, description = "No file or unsupported media type"),
        (status = 413, description = "File exceeds the upload limit"),
        (status = 500, description = "Evidence store unavailable")
    )
)]
pub async fn upload_evidence(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let form = read_form(multipart?).await?;
    let blob = form.file.ok_or(WorkflowError::MissingEvidence)?;

    let cid = state.workflow.upload_evidence(blob).await?;
    Ok(Json(UploadResponse { cid }))
}
