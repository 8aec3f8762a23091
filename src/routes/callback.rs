// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth redirect target for the one-time interactive authorization.
//!
//! The handler never holds on to the code itself: it hands the outcome of
//! the redirect to the waiting flow over a one-shot channel.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

const SUCCESS_PAGE: &str = "<!DOCTYPE html><html><head><title>Strava authorization</title></head>\
<body><p>Authorization successful! You can close this window and return to the script.</p></body></html>";

const DENIED_PAGE: &str = "<!DOCTYPE html><html><head><title>Strava authorization</title></head>\
<body><p>Authorization was not granted. You can close this window.</p></body></html>";

const MISSING_CODE_PAGE: &str = "<!DOCTYPE html><html><head><title>Strava authorization</title></head>\
<body><p>No authorization code was received.</p></body></html>";

const INVALID_STATE_PAGE: &str = "<!DOCTYPE html><html><head><title>Strava authorization</title></head>\
<body><p>Invalid or tampered authorization state.</p></body></html>";

const ALREADY_HANDLED_PAGE: &str = "<!DOCTYPE html><html><head><title>Strava authorization</title></head>\
<body><p>Authorization was already handled.</p></body></html>";

/// What Strava sent back to the redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code {
        code: String,
        /// Scopes the user actually granted (comma separated)
        scope: Option<String>,
    },
    Denied(String),
    MissingCode,
}

/// Shared state for the callback route.
#[derive(Clone)]
pub struct CallbackState {
    state_key: SecretString,
    sender: Arc<Mutex<Option<oneshot::Sender<CallbackOutcome>>>>,
}

impl CallbackState {
    pub fn new(state_key: SecretString, sender: oneshot::Sender<CallbackOutcome>) -> Self {
        Self {
            state_key,
            sender: Arc::new(Mutex::new(Some(sender))),
        }
    }
}

pub fn routes(path: &str) -> Router<CallbackState> {
    Router::new().route(path, get(auth_callback))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - report the outcome to the waiting flow.
async fn auth_callback(
    State(state): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, Html<&'static str>) {
    let state_ok = params
        .state
        .as_deref()
        .is_some_and(|s| verify_state(s, state.state_key.expose_secret().as_bytes()));

    if !state_ok {
        tracing::warn!("Ignoring OAuth callback with missing or invalid state");
        return (StatusCode::BAD_REQUEST, Html(INVALID_STATE_PAGE));
    }

    let (outcome, status, page) = match (params.error, params.code) {
        (Some(error), _) => {
            tracing::warn!(error = %error, "OAuth error from Strava");
            (CallbackOutcome::Denied(error), StatusCode::OK, DENIED_PAGE)
        }
        (None, Some(code)) if !code.is_empty() => (
            CallbackOutcome::Code {
                code,
                scope: params.scope,
            },
            StatusCode::OK,
            SUCCESS_PAGE,
        ),
        (None, _) => (
            CallbackOutcome::MissingCode,
            StatusCode::BAD_REQUEST,
            MISSING_CODE_PAGE,
        ),
    };

    let Some(sender) = state.sender.lock().await.take() else {
        tracing::debug!("Duplicate OAuth callback ignored");
        return (StatusCode::CONFLICT, Html(ALREADY_HANDLED_PAGE));
    };

    if sender.send(outcome).is_err() {
        tracing::warn!("Authorization flow no longer waiting for callback");
    }

    (status, Html(page))
}

/// Build a signed OAuth `state` value: base64("timestamp_hex|signature_hex").
pub fn create_state(secret: &[u8]) -> Option<String> {
    let payload = format!("{:x}", chrono::Utc::now().timestamp_millis());

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Some(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify the HMAC signature on an OAuth `state` value.
pub fn verify_state(state: &str, secret: &[u8]) -> bool {
    let Some(state_str) = URL_SAFE_NO_PAD
        .decode(state)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    else {
        return false;
    };

    // Format is "timestamp_hex|signature_hex"
    let Some((payload, signature_hex)) = state_str.split_once('|') else {
        return false;
    };

    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return false;
    }

    true
}
