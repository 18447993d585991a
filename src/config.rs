// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded once from the environment at startup and passed
//! to every component at construction time. Missing or malformed required
//! variables abort startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATABASE_URL` | Path of the user directory database file | Required |
//! | `JWT_SECRET_KEY` | HMAC secret for session tokens | Required |
//! | `JWT_ACCESS_TOKEN_EXPIRES` | Session lifetime in seconds | Required |
//! | `ENCRYPTION_SECRET` | Vault key (URL-safe base64, 32 bytes) | Required |
//! | `INFURA_PROJECT_ID` | Sepolia RPC credential | Required |
//! | `ETHERSCAN_API_KEY` | Explorer API credential | Required |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `CHAIN_ID` | Default chain id for signing | `11155111` |
//! | `RPC_URL` | Overrides the Infura endpoint | derived |
//! | `EXPLORER_API_URL` | Etherscan-compatible API base | `https://api.etherscan.io/v2/api` |
//! | `HISTORY_PAGE_SIZE` | Max transactions per history call | `100` |
//! | `REQUEST_TIMEOUT_SECS` | Whole-request timeout | `30` |
//! | `KEY_EXPORT_ENABLED` | Allow `GET /private_key` | `true` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | Serve HTTPS when both are set | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{path::PathBuf, time::Duration};

use secrecy::SecretString;
use url::Url;

use crate::blockchain::SEPOLIA;

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const JWT_SECRET_KEY_ENV: &str = "JWT_SECRET_KEY";
pub const JWT_EXPIRES_ENV: &str = "JWT_ACCESS_TOKEN_EXPIRES";
pub const ENCRYPTION_SECRET_ENV: &str = "ENCRYPTION_SECRET";
pub const INFURA_PROJECT_ID_ENV: &str = "INFURA_PROJECT_ID";
pub const ETHERSCAN_API_KEY_ENV: &str = "ETHERSCAN_API_KEY";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HISTORY_PAGE_SIZE: u32 = 100;
const MAX_HISTORY_PAGE_SIZE: u32 = 10_000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Chain id used when a request does not carry one.
    pub chain_id: u64,
    pub rpc_url: Url,
}

#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub api_url: Url,
    pub api_key: SecretString,
    pub page_size: u32,
}

#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub jwt_secret: SecretString,
    pub session_ttl_secs: u64,
    pub encryption_secret: SecretString,
    pub chain: ChainConfig,
    pub explorer: ExplorerConfig,
    pub request_timeout: Duration,
    pub key_export_enabled: bool,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| -> Result<String, ConfigError> {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(var))
        };
        let optional = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_path = PathBuf::from(required(DATABASE_URL_ENV)?);
        let jwt_secret = SecretString::from(required(JWT_SECRET_KEY_ENV)?);
        let session_ttl_secs = parse_number::<u64>(JWT_EXPIRES_ENV, &required(JWT_EXPIRES_ENV)?)?;
        if session_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                var: JWT_EXPIRES_ENV,
                reason: "must be greater than zero".to_string(),
            });
        }
        let encryption_secret = SecretString::from(required(ENCRYPTION_SECRET_ENV)?);
        let infura_project_id = required(INFURA_PROJECT_ID_ENV)?;
        let explorer_api_key = SecretString::from(required(ETHERSCAN_API_KEY_ENV)?);

        let chain_id = match optional("CHAIN_ID") {
            Some(raw) => parse_number::<u64>("CHAIN_ID", &raw)?,
            None => SEPOLIA.chain_id,
        };

        let rpc_url = match optional("RPC_URL") {
            Some(raw) => parse_url("RPC_URL", &raw)?,
            None => parse_url(
                INFURA_PROJECT_ID_ENV,
                &format!("{}{}", SEPOLIA.rpc_url_base, infura_project_id),
            )?,
        };

        let api_url = parse_url(
            "EXPLORER_API_URL",
            &optional("EXPLORER_API_URL").unwrap_or_else(|| SEPOLIA.explorer_api_url.to_string()),
        )?;

        let page_size = match optional("HISTORY_PAGE_SIZE") {
            Some(raw) => parse_number::<u32>("HISTORY_PAGE_SIZE", &raw)?,
            None => DEFAULT_HISTORY_PAGE_SIZE,
        }
        .clamp(1, MAX_HISTORY_PAGE_SIZE);

        let request_timeout = Duration::from_secs(match optional("REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse_number::<u64>("REQUEST_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        });

        let key_export_enabled = match optional("KEY_EXPORT_ENABLED") {
            Some(raw) => parse_bool("KEY_EXPORT_ENABLED", &raw)?,
            None => true,
        };

        let tls = match (optional("TLS_CERT_PATH"), optional("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    var: "TLS_CERT_PATH",
                    reason: "TLS_CERT_PATH and TLS_KEY_PATH must be set together".to_string(),
                })
            }
        };

        let log_format = match optional("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let port = match optional("PORT") {
            Some(raw) => parse_number::<u16>("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host: optional("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            database_path,
            jwt_secret,
            session_ttl_secs,
            encryption_secret,
            chain: ChainConfig { chain_id, rpc_url },
            explorer: ExplorerConfig {
                api_url,
                api_key: explorer_api_key,
                page_size,
            },
            request_timeout,
            key_export_enabled,
            tls,
            log_format,
        })
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

fn parse_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse::<Url>().map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            var,
            reason: format!("expected a boolean, got `{other}`"),
        }),
    }
}
