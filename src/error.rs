// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types for the hide-from-feed job.
//!
//! Fatal errors (`ConfigError`, `AuthError`, `FetchError`) abort the run.
//! `UpdateError` is scoped to a single activity and never stops the job.

use reqwest::StatusCode;

/// Errors returned by the Strava HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Strava rate limit exceeded")]
    RateLimited,

    #[error("Strava rejected the access token: {0}")]
    Unauthorized(String),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("JSON parse error: {0}")]
    Decode(String),
}

impl ApiError {
    /// Marker Strava puts in 400 bodies when a grant is no longer valid.
    pub const INVALID_GRANT: &'static str = "invalid_grant";

    /// Check if this error means the credential itself is bad
    /// (as opposed to a transient or server-side failure).
    pub fn is_token_error(&self) -> bool {
        match self {
            ApiError::Unauthorized(_) => true,
            ApiError::Status { body, .. } => body.contains(Self::INVALID_GRANT),
            _ => false,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited)
    }
}

/// Token file read/write errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("token file I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("token file {path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Failure to obtain a usable access token. Always fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("callback listener failed: {0}")]
    Listener(#[source] std::io::Error),

    #[error("failed to sign OAuth state")]
    StateSigning,

    #[error("token response did not include a refresh token")]
    MissingRefreshToken,

    #[error("callback listener stopped before receiving a response")]
    CallbackAbandoned,

    #[error("authorization callback carried no code")]
    MissingCode,

    #[error("authorization denied by user: {0}")]
    Denied(String),

    #[error("token exchange failed: {0}")]
    Exchange(#[source] ApiError),

    #[error("token refresh failed: {0}")]
    Refresh(#[source] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure to list recent activities. Fatal, no partial results.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to retrieve activities: {0}")]
    Api(#[from] ApiError),

    #[error("activity {id} has unparseable start_date {value:?}")]
    InvalidTimestamp { id: u64, value: String },
}

/// Failure to hide a single activity. Logged and skipped.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("failed to fetch activity {id}: {source}")]
    Fetch {
        id: u64,
        #[source]
        source: ApiError,
    },

    #[error("failed to update activity {id}: {source}")]
    Write {
        id: u64,
        #[source]
        source: ApiError,
    },
}

/// Errors that abort a job run.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Result type alias for the job driver
pub type Result<T> = std::result::Result<T, JobError>;
