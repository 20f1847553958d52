// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and [`AppConfig`], which parses
//! them once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory of the registry database | unset (in-memory) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `CONTRACT_ADDRESS` | Address encrypted inputs are bound to | zero address |
//! | `OWNER_ADDRESS` | Registry owner | zero address |
//! | `ORACLE_PRIVATE_KEY` | Key of the in-process oracle | unset |
//! | `ORACLE_SIGNER_ADDRESS` | Accepted callback signer | derived from key |
//! | `ORACLE_POLL_INTERVAL_MS` | Oracle worker poll interval | `2000` |
//! | `PROPOSAL_EXPIRY_SECS` | Proposal time-to-live | `604800` |
//! | `COPROCESSOR_SECRET` | Hex key for mock input proofs | random |
//! | `AUTH_REQUIRE_SIGNATURES` | Require signed requests | `true` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files for HTTPS | unset |

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use alloy::primitives::Address;

use crate::gateway::{worker::DEFAULT_POLL_INTERVAL, GatewayError, OracleSigner};
use crate::registry::DEFAULT_PROPOSAL_EXPIRY_SECS;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the registry database directory.
///
/// When unset the registry lives in memory and is lost on restart.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default `RUST_LOG` filter.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

pub const CONTRACT_ADDRESS_ENV: &str = "CONTRACT_ADDRESS";
pub const OWNER_ADDRESS_ENV: &str = "OWNER_ADDRESS";

/// Hex private key of the oracle. Setting it starts the in-process
/// oracle worker.
pub const ORACLE_PRIVATE_KEY_ENV: &str = "ORACLE_PRIVATE_KEY";

/// Callback signer to accept when the oracle runs elsewhere. Must match the
/// key's address if both are set.
pub const ORACLE_SIGNER_ADDRESS_ENV: &str = "ORACLE_SIGNER_ADDRESS";

pub const ORACLE_POLL_INTERVAL_MS_ENV: &str = "ORACLE_POLL_INTERVAL_MS";
pub const PROPOSAL_EXPIRY_SECS_ENV: &str = "PROPOSAL_EXPIRY_SECS";

/// Hex secret of the mock coprocessor's proof key.
///
/// Persistent deployments should set this: proofs minted under one secret
/// do not verify under another.
pub const COPROCESSOR_SECRET_ENV: &str = "COPROCESSOR_SECRET";

/// Set to `false` to accept the address header without a signature.
/// Only honored in builds with the `dev` feature.
pub const AUTH_REQUIRE_SIGNATURES_ENV: &str = "AUTH_REQUIRE_SIGNATURES";

pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },

    #[error("Set {ORACLE_PRIVATE_KEY_ENV} or {ORACLE_SIGNER_ADDRESS_ENV}")]
    MissingOracle,

    #[error("Invalid oracle key: {0}")]
    OracleKey(#[from] GatewayError),

    #[error("{ORACLE_SIGNER_ADDRESS_ENV} is {configured} but the oracle key signs as {derived}")]
    OracleMismatch { configured: Address, derived: Address },

    #[error("Set both {TLS_CERT_PATH_ENV} and {TLS_KEY_PATH_ENV}, or neither")]
    IncompleteTls,

    #[error("Unsigned requests require a build with the `dev` feature")]
    UnsignedAuthNotAllowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Parsed process configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: Option<PathBuf>,
    pub log_format: LogFormat,
    pub contract_address: Address,
    pub owner: Address,
    /// Present when this process runs the oracle worker.
    pub oracle: Option<OracleSigner>,
    /// Address whose callback signatures the registry accepts.
    pub oracle_signer: Address,
    pub oracle_poll_interval: Duration,
    pub proposal_expiry_secs: u64,
    pub coprocessor_secret: Option<String>,
    pub require_signatures: bool,
    pub tls: Option<TlsPaths>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("data_dir", &self.data_dir)
            .field("log_format", &self.log_format)
            .field("contract_address", &self.contract_address)
            .field("owner", &self.owner)
            .field("oracle_worker", &self.oracle.is_some())
            .field("oracle_signer", &self.oracle_signer)
            .field("oracle_poll_interval", &self.oracle_poll_interval)
            .field("proposal_expiry_secs", &self.proposal_expiry_secs)
            .field("coprocessor_secret", &self.coprocessor_secret.as_ref().map(|_| "<redacted>"))
            .field("require_signatures", &self.require_signatures)
            .field("tls", &self.tls)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(get(PORT_ENV), PORT_ENV, DEFAULT_PORT)?;
        let data_dir = get(DATA_DIR_ENV).map(PathBuf::from);

        let log_format = match get(LOG_FORMAT_ENV).as_deref().map(str::trim) {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: LOG_FORMAT_ENV,
                    reason: format!("expected `json` or `pretty`, got `{other}`"),
                })
            }
        };

        let contract_address = parse_or(get(CONTRACT_ADDRESS_ENV), CONTRACT_ADDRESS_ENV, Address::ZERO)?;
        let owner = parse_or(get(OWNER_ADDRESS_ENV), OWNER_ADDRESS_ENV, Address::ZERO)?;

        let oracle = get(ORACLE_PRIVATE_KEY_ENV)
            .map(|key| OracleSigner::from_hex(&key))
            .transpose()?;
        let configured_signer: Option<Address> = get(ORACLE_SIGNER_ADDRESS_ENV)
            .map(|raw| parse_value(&raw, ORACLE_SIGNER_ADDRESS_ENV))
            .transpose()?;
        let oracle_signer = match (&oracle, configured_signer) {
            (Some(signer), Some(configured)) if signer.address() != configured => {
                return Err(ConfigError::OracleMismatch {
                    configured,
                    derived: signer.address(),
                })
            }
            (Some(signer), _) => signer.address(),
            (None, Some(configured)) => configured,
            (None, None) => return Err(ConfigError::MissingOracle),
        };

        let poll_ms = parse_or(
            get(ORACLE_POLL_INTERVAL_MS_ENV),
            ORACLE_POLL_INTERVAL_MS_ENV,
            DEFAULT_POLL_INTERVAL.as_millis() as u64,
        )?;
        if poll_ms == 0 {
            return Err(ConfigError::InvalidValue {
                var: ORACLE_POLL_INTERVAL_MS_ENV,
                reason: "must be positive".to_string(),
            });
        }

        let proposal_expiry_secs = parse_or(
            get(PROPOSAL_EXPIRY_SECS_ENV),
            PROPOSAL_EXPIRY_SECS_ENV,
            DEFAULT_PROPOSAL_EXPIRY_SECS,
        )?;

        let require_signatures = parse_or(
            get(AUTH_REQUIRE_SIGNATURES_ENV),
            AUTH_REQUIRE_SIGNATURES_ENV,
            true,
        )?;
        if !require_signatures && !cfg!(feature = "dev") {
            return Err(ConfigError::UnsignedAuthNotAllowed);
        }

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTls),
        };

        Ok(Self {
            host,
            port,
            data_dir,
            log_format,
            contract_address,
            owner,
            oracle,
            oracle_signer,
            oracle_poll_interval: Duration::from_millis(poll_ms),
            proposal_expiry_secs,
            coprocessor_secret: get(COPROCESSOR_SECRET_ENV),
            require_signatures,
            tls,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                var: HOST_ENV,
                reason: e.to_string(),
            })
    }
}

fn parse_value<T>(raw: &str, var: &'static str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        var,
        reason: e.to_string(),
    })
}

fn parse_or<T>(raw: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map_or(Ok(default), |raw| parse_value(&raw, var))
}
