// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{error::ApiError, models::IdentityStatusResponse, state::AppState};

/// Look up the current status of an identity.
///
/// Read-only; never signs or sends a transaction.
#[utoipa::path(
    get,
    path = "/search-by-nric/{nric}",
    tag = "Identity",
    params(
        ("nric" = String, Path, description = "National identity number")
    ),
    responses(
        (status = 200, description = "Identity status", body = IdentityStatusResponse),
        (status = 400, description = "Blank NRIC"),
        (status = 404, description = "NRIC is not registered"),
        (status = 500, description = "Ledger failure")
    )
)]
pub async fn search_by_nric(
    State(state): State<AppState>,
    Path(nric): Path<String>,
) -> Result<Json<IdentityStatusResponse>, ApiError> {
    let status = state.workflow.search(&nric).await?;
    Ok(Json(status.into()))
}
