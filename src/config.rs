// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! All settings come from the environment at startup. Secrets are never
//! logged.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RPC_URL` | JSON-RPC endpoint of the chain hosting the registry | Required |
//! | `CONTRACT_ADDRESS` | Identity registry contract address | Required |
//! | `REGISTRAR_PRIVATE_KEY` | Registrar signing key (hex or PEM) | Required unless `_PATH` is set |
//! | `REGISTRAR_PRIVATE_KEY_PATH` | File holding the registrar key | Optional |
//! | `TX_CONFIRMATION_TIMEOUT_SECS` | Max wait for a write receipt | `120` |
//! | `STORAGE_API_URL` | Base URL of the evidence upload gateway | Required |
//! | `STORAGE_KEY` | Storage agent signing key | Required |
//! | `STORAGE_PROOF` | Storage delegation proof | Required |
//! | `STORAGE_SPACE_DID` | Target storage space | Required |
//! | `STORAGE_TIMEOUT_SECS` | Upload request timeout | `60` |
//! | `STAGING_DIR` | Directory for temporary evidence files | system temp dir |
//! | `MAX_UPLOAD_BYTES` | Request body limit for uploads | `10485760` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3001` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM certificate chain and key; both or neither | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::blockchain::{RegistryConfig, DEFAULT_CONFIRMATION_TIMEOUT};
use crate::evidence::http_store::DEFAULT_STORAGE_TIMEOUT;
use crate::evidence::StorageCredentials;

pub const RPC_URL_ENV: &str = "RPC_URL";
pub const CONTRACT_ADDRESS_ENV: &str = "CONTRACT_ADDRESS";
pub const REGISTRAR_PRIVATE_KEY_ENV: &str = "REGISTRAR_PRIVATE_KEY";
pub const REGISTRAR_PRIVATE_KEY_PATH_ENV: &str = "REGISTRAR_PRIVATE_KEY_PATH";
pub const TX_CONFIRMATION_TIMEOUT_ENV: &str = "TX_CONFIRMATION_TIMEOUT_SECS";
pub const STORAGE_API_URL_ENV: &str = "STORAGE_API_URL";
pub const STORAGE_KEY_ENV: &str = "STORAGE_KEY";
pub const STORAGE_PROOF_ENV: &str = "STORAGE_PROOF";
pub const STORAGE_SPACE_DID_ENV: &str = "STORAGE_SPACE_DID";
pub const STORAGE_TIMEOUT_ENV: &str = "STORAGE_TIMEOUT_SECS";
pub const STAGING_DIR_ENV: &str = "STAGING_DIR";
pub const MAX_UPLOAD_BYTES_ENV: &str = "MAX_UPLOAD_BYTES";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";

/// Logging format selector (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;

/// 10 MiB, enough for a scanned certificate.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// PEM files for serving HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Fully resolved gateway configuration.
#[derive(Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub registry: RegistryConfig,
    pub registrar_key: String,
    pub storage_api_url: String,
    pub storage_credentials: StorageCredentials,
    pub storage_timeout: Duration,
    pub staging_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub tls: Option<TlsPaths>,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("rpc_url", &self.registry.rpc_url)
            .field("contract_address", &self.registry.contract_address)
            .field("storage_api_url", &self.storage_api_url)
            .field("staging_dir", &self.staging_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("tls", &self.tls.is_some())
            .finish_non_exhaustive()
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let registry = RegistryConfig {
            rpc_url: required(RPC_URL_ENV)?,
            contract_address: required(CONTRACT_ADDRESS_ENV)?,
            confirmation_timeout: parse_secs(
                TX_CONFIRMATION_TIMEOUT_ENV,
                get(TX_CONFIRMATION_TIMEOUT_ENV),
                DEFAULT_CONFIRMATION_TIMEOUT,
            )?,
        };

        let registrar_key = match get(REGISTRAR_PRIVATE_KEY_ENV) {
            Some(key) => key,
            None => {
                let path = get(REGISTRAR_PRIVATE_KEY_PATH_ENV)
                    .ok_or(ConfigError::Missing(REGISTRAR_PRIVATE_KEY_ENV))?;
                fs::read_to_string(&path)
                    .map_err(|e| ConfigError::Invalid {
                        name: REGISTRAR_PRIVATE_KEY_PATH_ENV,
                        reason: format!("failed to read {path}: {e}"),
                    })?
                    .trim()
                    .to_string()
            }
        };

        let storage_credentials = StorageCredentials {
            key: required(STORAGE_KEY_ENV)?,
            proof: required(STORAGE_PROOF_ENV)?,
            space_did: required(STORAGE_SPACE_DID_ENV)?,
        };

        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                reason: format!("{e}"),
            })?,
            None => DEFAULT_PORT,
        };

        let max_upload_bytes = match get(MAX_UPLOAD_BYTES_ENV) {
            Some(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
                name: MAX_UPLOAD_BYTES_ENV,
                reason: format!("{e}"),
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            registry,
            registrar_key,
            storage_api_url: required(STORAGE_API_URL_ENV)?,
            storage_credentials,
            storage_timeout: parse_secs(
                STORAGE_TIMEOUT_ENV,
                get(STORAGE_TIMEOUT_ENV),
                DEFAULT_STORAGE_TIMEOUT,
            )?,
            staging_dir: get(STAGING_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            max_upload_bytes,
            tls,
        })
    }
}

fn parse_secs(
    name: &'static str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}
