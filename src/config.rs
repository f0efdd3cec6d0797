// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup and is
//! immutable afterwards.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SERVICE_MODE` | `gateway` or `identity` | `gateway` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWT_SECRET` | Shared HMAC secret (identical in both services) | Required |
//! | `JWT_TTL_SECS` | Access token lifetime in seconds | `3600` |
//! | `JWT_LEEWAY_SECS` | Accepted clock skew past expiry | `0` |
//! | `IDENTITY_HEADER` | Header carrying the verified user ID | `X-User-Id` |
//! | `GATEWAY_ROUTES` | Upstreams as `prefix=url,prefix=url` | see [`DEFAULT_GATEWAY_ROUTES`] |
//! | `GATEWAY_BODY_LIMIT` | Max forwarded request body in bytes | `2097152` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderName;
use url::Url;

use crate::auth::propagation::DEFAULT_IDENTITY_HEADER;
use crate::auth::SigningSecret;

pub const SERVICE_MODE_ENV: &str = "SERVICE_MODE";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_TTL_ENV: &str = "JWT_TTL_SECS";
pub const JWT_LEEWAY_ENV: &str = "JWT_LEEWAY_SECS";
pub const IDENTITY_HEADER_ENV: &str = "IDENTITY_HEADER";
pub const GATEWAY_ROUTES_ENV: &str = "GATEWAY_ROUTES";
pub const GATEWAY_BODY_LIMIT_ENV: &str = "GATEWAY_BODY_LIMIT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TTL_SECS: u64 = 3600;
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;
pub const DEFAULT_GATEWAY_ROUTES: &str =
    "/auth=http://127.0.0.1:8081,/posts=http://127.0.0.1:8082,/comments=http://127.0.0.1:8083";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// HMAC-SHA256 keys shorter than the digest size are accepted but weak.
pub const MIN_RECOMMENDED_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value `{value}`: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(name: &'static str, value: &str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Which process this binary runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMode {
    Gateway,
    Identity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// `json` selects JSON output; anything else is pretty.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }

    /// Read `LOG_FORMAT` directly, before the rest of the settings are loaded.
    pub fn from_env() -> Self {
        Self::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref())
    }
}

/// One upstream service behind the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRoute {
    pub prefix: String,
    pub target: Url,
}

/// Token settings shared by issuer and verifier.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: SigningSecret,
    pub ttl: Duration,
    pub leeway_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub mode: ServiceMode,
    pub bind: SocketAddr,
    pub jwt: JwtSettings,
    pub identity_header: HeaderName,
    pub routes: Vec<UpstreamRoute>,
    pub body_limit: usize,
    pub log_format: LogFormat,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mode = match get(SERVICE_MODE_ENV).as_deref() {
            None | Some("gateway") => ServiceMode::Gateway,
            Some("identity") => ServiceMode::Identity,
            Some(other) => {
                return Err(ConfigError::invalid(
                    SERVICE_MODE_ENV,
                    other,
                    "expected `gateway` or `identity`",
                ))
            }
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(get(PORT_ENV), PORT_ENV, DEFAULT_PORT)?;
        let bind: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| ConfigError::invalid(HOST_ENV, &host, e))?;

        let secret = lookup(JWT_SECRET_ENV)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;
        if secret.len() < MIN_RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                length = secret.len(),
                recommended = MIN_RECOMMENDED_SECRET_LEN,
                "JWT secret is shorter than recommended"
            );
        }

        let jwt = JwtSettings {
            secret: SigningSecret::new(secret),
            ttl: Duration::from_secs(parse_or(get(JWT_TTL_ENV), JWT_TTL_ENV, DEFAULT_TTL_SECS)?),
            leeway_secs: parse_or(get(JWT_LEEWAY_ENV), JWT_LEEWAY_ENV, 0)?,
        };
        if jwt.ttl.is_zero() {
            return Err(ConfigError::invalid(JWT_TTL_ENV, "0", "must be positive"));
        }

        let identity_header = match get(IDENTITY_HEADER_ENV) {
            Some(name) => HeaderName::from_bytes(name.trim().as_bytes())
                .map_err(|e| ConfigError::invalid(IDENTITY_HEADER_ENV, &name, e))?,
            None => HeaderName::from_static(DEFAULT_IDENTITY_HEADER),
        };

        let routes = parse_routes(
            get(GATEWAY_ROUTES_ENV)
                .as_deref()
                .unwrap_or(DEFAULT_GATEWAY_ROUTES),
        )?;

        let body_limit = parse_or(get(GATEWAY_BODY_LIMIT_ENV), GATEWAY_BODY_LIMIT_ENV, DEFAULT_BODY_LIMIT)?;

        let log_format = LogFormat::parse(get(LOG_FORMAT_ENV).as_deref());

        Ok(Self {
            mode,
            bind,
            jwt,
            identity_header,
            routes,
            body_limit,
            log_format,
        })
    }
}

fn parse_or<T>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::invalid(name, &raw, e)),
        None => Ok(default),
    }
}

/// Parse `prefix=url,prefix=url`.
pub fn parse_routes(raw: &str) -> Result<Vec<UpstreamRoute>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (prefix, target) = entry.split_once('=').ok_or_else(|| {
                ConfigError::invalid(GATEWAY_ROUTES_ENV, entry, "expected `prefix=url`")
            })?;
            let prefix = prefix.trim();
            if !prefix.starts_with('/') {
                return Err(ConfigError::invalid(
                    GATEWAY_ROUTES_ENV,
                    entry,
                    "prefix must start with `/`",
                ));
            }
            let target = Url::parse(target.trim())
                .map_err(|e| ConfigError::invalid(GATEWAY_ROUTES_ENV, entry, e))?;
            Ok(UpstreamRoute {
                prefix: prefix.trim_end_matches('/').to_string(),
                target,
            })
        })
        .collect()
}
