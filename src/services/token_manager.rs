// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access token lifecycle.
//!
//! The stored token is in one of three states:
//! - absent: run the interactive authorization and persist the result
//! - expired (`expires_at <= now`): refresh once and persist before returning
//! - valid: return the stored access token with no network call
//!
//! Any failure talking to the token endpoint is fatal for the run.

use crate::db::TokenStore;
use crate::error::AuthError;
use crate::models::TokenRecord;
use crate::services::authorize::AuthorizationFlow;
use crate::services::strava::{StravaClient, TokenResponse};
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};

/// Produces a valid access token for the job.
pub struct TokenManager {
    client: StravaClient,
    store: TokenStore,
    flow: AuthorizationFlow,
}

impl TokenManager {
    pub fn new(client: StravaClient, store: TokenStore, flow: AuthorizationFlow) -> Self {
        Self {
            client,
            store,
            flow,
        }
    }

    /// Get a valid (non-expired) access token, authorizing or refreshing
    /// as needed.
    pub async fn get_access_token(&self) -> Result<String, AuthError> {
        self.get_access_token_at(Utc::now()).await
    }

    /// Same as [`get_access_token`](Self::get_access_token) with an explicit
    /// notion of "now".
    pub async fn get_access_token_at(&self, now: DateTime<Utc>) -> Result<String, AuthError> {
        let Some(record) = self.store.load().await? else {
            tracing::info!(
                path = %self.store.path().display(),
                "No token file found, starting manual authorization"
            );
            let record = self.flow.run().await?;
            self.store.save(&record).await?;
            tracing::info!("Initial token saved");
            return Ok(record.access_token);
        };

        if !record.is_expired_at(now) {
            tracing::info!(
                expires_at = %record
                    .expires_at_utc()
                    .map(format_utc_rfc3339)
                    .unwrap_or_default(),
                "Using existing token"
            );
            return Ok(record.access_token);
        }

        tracing::info!("Token expired, refreshing");
        let response = self
            .client
            .refresh_token(&record.refresh_token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Token refresh failed");
                AuthError::Refresh(e)
            })?;

        let refreshed = apply_refresh(record, response);
        self.store.save(&refreshed).await?;

        tracing::info!("Token refreshed successfully");
        Ok(refreshed.access_token)
    }
}

/// Build the record to persist after a refresh.
///
/// Keeps the previous refresh token when the response does not carry a
/// new one, so the stored record always stays refreshable.
fn apply_refresh(previous: TokenRecord, response: TokenResponse) -> TokenRecord {
    let refresh_token = match response.refresh_token {
        Some(token) if !token.is_empty() => token,
        _ => {
            tracing::warn!("Refresh response had no refresh_token, keeping the previous one");
            previous.refresh_token
        }
    };

    TokenRecord {
        access_token: response.access_token,
        refresh_token,
        expires_at: response.expires_at,
    }
}
