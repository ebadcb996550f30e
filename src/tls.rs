// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTPS termination with rustls.
//!
//! The gateway serves plain HTTP unless both `TLS_CERT_PATH` and
//! `TLS_KEY_PATH` are set.

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsPaths;

#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("Failed to load TLS certificate {cert} / key {key}: {source}")]
    Load {
        cert: String,
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Install the ring crypto provider for rustls.
///
/// Must run before any TLS configuration is built. Repeated calls are
/// harmless.
pub fn install_crypto_provider() {
    // Err only means a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Build the server TLS configuration from PEM files.
pub async fn load_rustls_config(paths: &TlsPaths) -> Result<RustlsConfig, TlsError> {
    install_crypto_provider();

    RustlsConfig::from_pem_file(&paths.cert, &paths.key)
        .await
        .map_err(|source| TlsError::Load {
            cert: paths.cert.display().to_string(),
            key: paths.key.display().to_string(),
            source,
        })
}
