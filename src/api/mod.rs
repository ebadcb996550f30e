// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        BindIdentityRequest, BindIdentityResponse, DeathRecordView, EvidenceUploadForm,
        IdentityStatusResponse, RecordDeathForm, RecordDeathRequest, RecordDeathResponse,
        UploadResponse,
    },
    state::AppState,
};

pub mod health;
pub mod identity;
pub mod search;
pub mod upload;

pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/upload", post(upload::upload_evidence))
        .route("/bind-identity", post(identity::bind_identity))
        .route("/record-death", post(identity::record_death))
        .route("/search-by-nric/{nric}", get(search::search_by_nric))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        upload::upload_evidence,
        identity::bind_identity,
        identity::record_death,
        search::search_by_nric,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            EvidenceUploadForm,
            UploadResponse,
            BindIdentityRequest,
            BindIdentityResponse,
            RecordDeathRequest,
            RecordDeathForm,
            RecordDeathResponse,
            DeathRecordView,
            IdentityStatusResponse,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "Evidence", description = "Evidence document storage"),
        (name = "Identity", description = "NRIC binding, death registration and lookup"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
