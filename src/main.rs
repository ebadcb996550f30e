// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, sync::Arc, time::Duration};

use identity_registry_gateway::{
    api::router,
    blockchain::{registrar_signer, RegistryClient},
    config::{GatewayConfig, DEFAULT_LOG_FILTER, LOG_FORMAT_ENV},
    evidence::HttpEvidenceStore,
    state::AppState,
    tls,
    workflow::IdentityWorkflow,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Grace period for in-flight requests (writes wait on receipts) at shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Cancel `token` on Ctrl+C or SIGTERM.
async fn watch_signals(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
    token.cancel();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = GatewayConfig::from_env().expect("Invalid gateway configuration");
    info!(?config, "Configuration loaded");

    let signer = registrar_signer(&config.registrar_key).expect("Failed to load registrar key");
    let ledger =
        RegistryClient::new(&config.registry, signer).expect("Failed to create registry client");
    let evidence = HttpEvidenceStore::new(
        &config.storage_api_url,
        config.storage_credentials.clone(),
        config.staging_dir.clone(),
        config.storage_timeout,
    )
    .expect("Failed to create evidence store client");

    let workflow = IdentityWorkflow::new(Arc::new(ledger), Arc::new(evidence));
    info!(registrar = %workflow.registrar(), "Registrar signer ready");

    match workflow.chain_head().await {
        Ok(block) => info!(block, "Connected to registry RPC"),
        Err(e) => warn!(error = %e, "Registry RPC not reachable yet; readiness will report degraded"),
    }

    let state = AppState::new(workflow).with_max_upload_bytes(config.max_upload_bytes);
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Failed to parse bind address");

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    match &config.tls {
        Some(paths) => {
            let tls_config = tls::load_rustls_config(paths)
                .await
                .expect("Failed to load TLS configuration");

            let handle = axum_server::Handle::new();
            let shutdown_handle = handle.clone();
            let token = shutdown.clone();
            tokio::spawn(async move {
                token.cancelled().await;
                shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
            });

            info!(%addr, "Identity registry gateway listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .expect("HTTPS server failed");
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .expect("Failed to bind listener");

            info!(%addr, "Identity registry gateway listening on http (docs at /docs)");
            let token = shutdown.clone();
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await
                .expect("HTTP server failed");
        }
    }

    info!("Gateway stopped");
}
