// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client for the OAuth token endpoint and activities.
//!
//! Handles:
//! - Authorization URL construction
//! - Code exchange and token refresh
//! - Recent activity listing
//! - Activity detail fetch and `hide_from_home` updates

use crate::config::{Config, DEFAULT_API_BASE_URL, DEFAULT_OAUTH_BASE_URL};
use crate::error::ApiError;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Scopes needed to read private activities and change their visibility.
pub const REQUIRED_SCOPES: &str = "activity:write,activity:read_all";

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
    oauth_url: String,
    client_id: String,
    client_secret: SecretString,
}

impl StravaClient {
    /// Create a new Strava client with OAuth credentials.
    pub fn new(client_id: String, client_secret: SecretString) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            oauth_url: DEFAULT_OAUTH_BASE_URL.to_string(),
            client_id,
            client_secret,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.client_id.clone(), config.client_secret.clone())
            .with_base_urls(&config.api_base_url, &config.oauth_base_url)
    }

    /// Point the client at different API and OAuth roots.
    pub fn with_base_urls(mut self, api_base_url: &str, oauth_base_url: &str) -> Self {
        self.base_url = api_base_url.trim_end_matches('/').to_string();
        self.oauth_url = oauth_base_url.trim_end_matches('/').to_string();
        self
    }

    /// Client secret, used to key the OAuth `state` signature.
    pub fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }

    /// URL the user's browser is sent to for authorization.
    pub fn authorize_url(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "{}/authorize?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             approval_prompt=auto&\
             scope={}&\
             state={}",
            self.oauth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            REQUIRED_SCOPES,
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for the initial tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, ApiError> {
        self.post_token(&[("code", code), ("grant_type", "authorization_code")])
            .await
    }

    /// Refresh an expired access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, ApiError> {
        self.post_token(&[
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .await
    }

    /// Get a detailed activity by ID.
    pub async fn get_activity(
        &self,
        access_token: &str,
        activity_id: u64,
    ) -> Result<StravaActivity, ApiError> {
        let url = format!("{}/activities/{}", self.base_url, activity_id);
        self.get_json(&url, access_token, &[]).await
    }

    /// List the athlete's activities, most recent first.
    pub async fn list_activities(
        &self,
        access_token: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<StravaActivitySummary>, ApiError> {
        let url = format!("{}/athlete/activities", self.base_url);
        self.get_json(
            &url,
            access_token,
            &[("page", page.to_string()), ("per_page", per_page.to_string())],
        )
        .await
    }

    /// Set `hide_from_home` on an activity.
    pub async fn hide_activity(&self, access_token: &str, activity_id: u64) -> Result<(), ApiError> {
        let url = format!("{}/activities/{}", self.base_url, activity_id);

        let body = serde_json::json!({
            "hide_from_home": true
        });

        let response = self
            .http
            .put(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        check_response(response).await?;
        Ok(())
    }

    async fn post_token(&self, grant: &[(&str, &str)]) -> Result<TokenResponse, ApiError> {
        let mut form = vec![
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
        ];
        form.extend_from_slice(grant);

        let response = self
            .http
            .post(format!("{}/token", self.oauth_url))
            .form(&form)
            .send()
            .await?;

        check_response_json(response).await
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await?;

        check_response_json(response).await
    }
}

/// Check response status and return error if not successful.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            tracing::warn!("Strava rate limit hit (429)");
            Err(ApiError::RateLimited)
        }
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized(body)),
        _ => Err(ApiError::Status { status, body }),
    }
}

/// Check response and parse JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    check_response(response)
        .await?
        .json()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

/// Token endpoint response (code exchange and refresh).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Strava always sends one today, but rotation is not guaranteed.
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_at: i64,
}

/// Detailed Strava activity response.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaActivity {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub hide_from_home: bool,
}

/// Summary activity for list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaActivitySummary {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub sport_type: Option<String>,
    /// UTC, `%Y-%m-%dT%H:%M:%SZ`
    pub start_date: String,
}
