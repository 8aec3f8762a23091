// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Job configuration loaded from environment variables (and `.env`).
//!
//! Everything is read once at startup and stays immutable for the
//! lifetime of the process.

use crate::error::ConfigError;
use reqwest::Url;
use secrecy::SecretString;
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8000/callback";
pub const DEFAULT_LOOKBACK_MINUTES: u32 = 300;
pub const DEFAULT_API_BASE_URL: &str = "https://www.strava.com/api/v3";
pub const DEFAULT_OAUTH_BASE_URL: &str = "https://www.strava.com/oauth";
const DEFAULT_TOKEN_FILE_NAME: &str = ".strava_token.json";

/// Job configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Strava OAuth client ID (public)
    pub client_id: String,
    /// Strava OAuth client secret
    pub client_secret: SecretString,
    /// Where Strava redirects after authorization; also decides
    /// the address of the local callback listener.
    pub redirect_uri: String,
    /// Activities that started within this many minutes are hidden.
    pub lookback_minutes: u32,
    /// Location of the persisted token record.
    pub token_file: PathBuf,
    pub api_base_url: String,
    pub oauth_base_url: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            client_id: "test_client_id".to_string(),
            client_secret: SecretString::from("test_secret".to_string()),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            lookback_minutes: DEFAULT_LOOKBACK_MINUTES,
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE_NAME),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            oauth_base_url: DEFAULT_OAUTH_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_env_with(|k| env::var(k).ok())
    }

    /// Build configuration from an arbitrary variable lookup, so tests
    /// don't have to mutate the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let client_id = required(&mut get, "CLIENT_ID")?;
        let client_secret = required(&mut get, "CLIENT_SECRET")?;

        let redirect_uri =
            get("REDIRECT_URI").unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());

        let lookback_minutes = match get("ACTIVITY_LOOKBACK_MINUTES") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|e| ConfigError::Invalid {
                    name: "ACTIVITY_LOOKBACK_MINUTES",
                    reason: e.to_string(),
                })?,
            None => DEFAULT_LOOKBACK_MINUTES,
        };

        let token_file = match get("TOKEN_FILE") {
            Some(path) => PathBuf::from(path),
            None => get("HOME")
                .map(|home| PathBuf::from(home).join(DEFAULT_TOKEN_FILE_NAME))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE_NAME)),
        };

        let config = Self {
            client_id,
            client_secret: SecretString::from(client_secret),
            redirect_uri,
            lookback_minutes,
            token_file,
            api_base_url: get("STRAVA_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            oauth_base_url: get("STRAVA_OAUTH_BASE")
                .unwrap_or_else(|| DEFAULT_OAUTH_BASE_URL.to_string()),
        };

        // Fail early rather than in the middle of an interactive authorization.
        config.callback_bind_addr()?;

        Ok(config)
    }

    /// Socket address for the local callback listener, derived from
    /// the host and port of `redirect_uri`.
    pub fn callback_bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let url = self.parsed_redirect_uri()?;

        let ip = match url.host_str() {
            Some("localhost") => IpAddr::V4(Ipv4Addr::LOCALHOST),
            Some(host) => host
                .trim_start_matches('[')
                .trim_end_matches(']')
                .parse()
                .map_err(|_| ConfigError::Invalid {
                    name: "REDIRECT_URI",
                    reason: format!("host {host} is not a local address"),
                })?,
            None => {
                return Err(ConfigError::Invalid {
                    name: "REDIRECT_URI",
                    reason: "missing host".to_string(),
                })
            }
        };

        let port = url.port_or_known_default().ok_or(ConfigError::Invalid {
            name: "REDIRECT_URI",
            reason: "missing port".to_string(),
        })?;

        Ok(SocketAddr::new(ip, port))
    }

    /// Path component of `redirect_uri` the callback route is mounted on.
    pub fn callback_path(&self) -> Result<String, ConfigError> {
        Ok(self.parsed_redirect_uri()?.path().to_string())
    }

    fn parsed_redirect_uri(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.redirect_uri).map_err(|e| ConfigError::Invalid {
            name: "REDIRECT_URI",
            reason: e.to_string(),
        })?;

        if url.scheme() != "http" {
            return Err(ConfigError::Invalid {
                name: "REDIRECT_URI",
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }

        Ok(url)
    }
}

fn required<F>(get: &mut F, name: &'static str) -> Result<String, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}
