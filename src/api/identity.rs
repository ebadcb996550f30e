// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registry write endpoints.
//!
//! Both endpoints block until the transaction receipt is available, so a 200
//! response always carries a mined transaction.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    Json,
};

use super::upload::read_form;
use crate::{
    error::ApiError,
    models::{
        BindIdentityRequest, BindIdentityResponse, RecordDeathRequest, RecordDeathResponse,
    },
    state::AppState,
    workflow::DeathRegistration,
};

/// Bind an NRIC to a wallet.
///
/// Fails with 400 when either side of the pair is already bound. The
/// response carries the conflicting counterpart (`existingWallet` or
/// `existingNric`).
#[utoipa::path(
    post,
    path = "/bind-identity",
    tag = "Identity",
    request_body = BindIdentityRequest,
    responses(
        (status = 200, description = "Identity bound", body = BindIdentityResponse),
        (status = 400, description = "Missing or invalid input, or already bound"),
        (status = 403, description = "Gateway signer is not an authorized registrar"),
        (status = 500, description = "Ledger failure")
    )
)]
pub async fn bind_identity(
    State(state): State<AppState>,
    body: Result<Json<BindIdentityRequest>, JsonRejection>,
) -> Result<Json<BindIdentityResponse>, ApiError> {
    let Json(request) = body?;
    let nric = request.nric.unwrap_or_default();
    let wallet = request.wallet.unwrap_or_default();

    let confirmation = state.workflow.bind(&nric, &wallet).await?;
    Ok(Json(confirmation.into()))
}

/// A death registration submitted as JSON or as a multipart form.
pub struct DeathSubmission(pub DeathRegistration);

impl<S> FromRequest<S> for DeathSubmission
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| {
                value
                    .trim_start()
                    .to_ascii_lowercase()
                    .starts_with("multipart/form-data")
            });

        if is_multipart {
            let multipart = Multipart::from_request(req, state).await?;
            let form = read_form(multipart).await?;
            return Ok(Self(DeathRegistration {
                nric: form.field("nric").unwrap_or_default(),
                metadata_cid: form.field("metadataCID"),
                evidence: form.file,
            }));
        }

        let Json(request) = Json::<RecordDeathRequest>::from_request(req, state).await?;
        Ok(Self(DeathRegistration {
            nric: request.nric.unwrap_or_default(),
            metadata_cid: request.metadata_cid,
            evidence: None,
        }))
    }
}

/// Record a death and mint the soul-bound attestation.
///
/// Evidence is either referenced by `metadataCID` or uploaded in the same
/// request as a multipart `file` part (see [`crate::models::RecordDeathForm`]).
/// A supplied CID takes precedence over an uploaded file.
#[utoipa::path(
    post,
    path = "/record-death",
    tag = "Identity",
    request_body(
        content = RecordDeathRequest,
        content_type = "application/json",
        description = "JSON body, or multipart/form-data with the fields of RecordDeathForm"
    ),
    responses(
        (status = 200, description = "Death recorded", body = RecordDeathResponse),
        (status = 400, description = "Missing NRIC or evidence, or unsupported media type"),
        (status = 403, description = "Gateway signer is not an authorized registrar"),
        (status = 404, description = "NRIC is not registered"),
        (status = 500, description = "Evidence store or ledger failure; see orphanedCid")
    )
)]
pub async fn record_death(
    State(state): State<AppState>,
    DeathSubmission(registration): DeathSubmission,
) -> Result<Json<RecordDeathResponse>, ApiError> {
    let receipt = state.workflow.record_death(registration).await?;
    Ok(Json(receipt.into()))
}
