// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded once from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for documents and attachments | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `5000` |
//! | `JWT_SECRET` | HMAC secret for session tokens | random per process |
//! | `TOKEN_TTL_DAYS` | Session token lifetime in days | `7` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use chrono::Duration;

use crate::{auth::DEFAULT_TOKEN_TTL_DAYS, storage::paths::DATA_ROOT};

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
/// Environment variable name for the session signing secret.
///
/// When unset, a random secret is generated and every token is invalidated
/// on restart.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const TOKEN_TTL_DAYS_ENV: &str = "TOKEN_TTL_DAYS";
/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Shortest accepted `JWT_SECRET`, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("{JWT_SECRET_ENV} must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Where the session signing secret came from.
#[derive(Clone, PartialEq, Eq)]
pub enum SecretSource {
    Configured(Vec<u8>),
    Generated(Vec<u8>),
}

impl SecretSource {
    pub fn bytes(&self) -> &[u8] {
        match self {
            SecretSource::Configured(bytes) | SecretSource::Generated(bytes) => bytes,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, SecretSource::Generated(_))
    }
}

impl std::fmt::Debug for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::Configured(_) => f.write_str("Configured(<redacted>)"),
            SecretSource::Generated(_) => f.write_str("Generated(<redacted>)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    pub jwt_secret: SecretSource,
    pub token_ttl: Duration,
    pub log_format: LogFormat,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let data_dir = get(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DATA_ROOT));

        let host = match get(HOST_ENV) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: HOST_ENV,
                value: raw,
                expected: "an IP address",
            })?,
            None => DEFAULT_HOST.parse().map_err(|_| ConfigError::Invalid {
                name: HOST_ENV,
                value: DEFAULT_HOST.to_string(),
                expected: "an IP address",
            })?,
        };

        let port = match get(PORT_ENV) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                value: raw,
                expected: "a port number",
            })?,
            None => DEFAULT_PORT,
        };

        let token_ttl_days = match get(TOKEN_TTL_DAYS_ENV) {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(days) if (1..=365).contains(&days) => days,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: TOKEN_TTL_DAYS_ENV,
                        value: raw,
                        expected: "a whole number of days between 1 and 365",
                    })
                }
            },
            None => DEFAULT_TOKEN_TTL_DAYS,
        };

        let jwt_secret = match get(JWT_SECRET_ENV) {
            Some(secret) if secret.len() < MIN_SECRET_LEN => return Err(ConfigError::WeakSecret),
            Some(secret) => SecretSource::Configured(secret.into_bytes()),
            None => SecretSource::Generated(random_secret()),
        };

        let log_format = match get(LOG_FORMAT_ENV).map(|v| v.trim().to_lowercase()) {
            None => LogFormat::Pretty,
            Some(v) if v == "json" => LogFormat::Json,
            Some(v) if v == "pretty" => LogFormat::Pretty,
            Some(v) => {
                return Err(ConfigError::Invalid {
                    name: LOG_FORMAT_ENV,
                    value: v,
                    expected: "'json' or 'pretty'",
                })
            }
        };

        Ok(Self {
            data_dir,
            host,
            port,
            jwt_secret,
            token_ttl: Duration::days(token_ttl_days),
            log_format,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn random_secret() -> Vec<u8> {
    let mut secret = Vec::with_capacity(64);
    for _ in 0..4 {
        secret.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
    }
    secret
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:5000");
        assert_eq!(config.token_ttl, Duration::days(7));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.jwt_secret.is_generated());
        assert_eq!(config.jwt_secret.bytes().len(), 64);
    }

    #[test]
    fn reads_every_variable() {
        let secret = "s".repeat(40);
        let config = load(&[
            ("DATA_DIR", "/srv/ledger"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8081"),
            ("JWT_SECRET", &secret),
            ("TOKEN_TTL_DAYS", "14"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/ledger"));
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:8081");
        assert_eq!(config.jwt_secret, SecretSource::Configured(secret.into_bytes()));
        assert_eq!(config.token_ttl, Duration::days(14));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_numbers_fail_startup() {
        assert!(matches!(
            load(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
        assert!(matches!(
            load(&[("TOKEN_TTL_DAYS", "0")]),
            Err(ConfigError::Invalid { name: "TOKEN_TTL_DAYS", .. })
        ));
        assert!(matches!(
            load(&[("LOG_FORMAT", "xml")]),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn short_secret_is_rejected() {
        assert!(matches!(
            load(&[("JWT_SECRET", "short")]),
            Err(ConfigError::WeakSecret)
        ));
    }

    #[test]
    fn secret_is_not_printed() {
        let config = load(&[("JWT_SECRET", &"x".repeat(32))]).unwrap();
        assert!(!format!("{config:?}").contains("xxxx"));
    }
}
