// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interactive first-time authorization.
//!
//! Flow:
//! 1. Bind the callback listener on the redirect URI's address
//! 2. Open the Strava authorization page in the user's browser
//! 3. Wait for the callback route to report the redirect outcome
//! 4. Shut the listener down gracefully (lets the response flush)
//! 5. Exchange the code for the initial token record
//!
//! There is no timeout: if the user never completes the redirect the flow
//! waits forever.

use crate::config::Config;
use crate::error::{AuthError, ConfigError};
use crate::models::TokenRecord;
use crate::routes::callback::{self, CallbackOutcome, CallbackState};
use crate::services::strava::{StravaClient, REQUIRED_SCOPES};
use secrecy::ExposeSecret;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Something that can show the authorization page to the user.
pub trait BrowserOpener: Send + Sync {
    fn open(&self, url: &str) -> std::io::Result<()>;
}

/// Opens URLs with the platform's default browser.
pub struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        open::that(url)
    }
}

/// One-shot OAuth authorization-code flow with a local callback listener.
pub struct AuthorizationFlow {
    client: StravaClient,
    redirect_uri: String,
    bind_addr: SocketAddr,
    callback_path: String,
    browser: Box<dyn BrowserOpener>,
}

impl AuthorizationFlow {
    pub fn new(
        config: &Config,
        client: StravaClient,
        browser: Box<dyn BrowserOpener>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            client,
            redirect_uri: config.redirect_uri.clone(),
            bind_addr: config.callback_bind_addr()?,
            callback_path: config.callback_path()?,
            browser,
        })
    }

    /// Run the whole flow and return the initial token record.
    pub async fn run(&self) -> Result<TokenRecord, AuthError> {
        let listener = TcpListener::bind(self.bind_addr)
            .await
            .map_err(AuthError::Listener)?;

        let code = self.capture_code(listener).await?;

        tracing::info!("Exchanging authorization code for tokens");
        let response = self.client.exchange_code(&code).await.map_err(|e| {
            tracing::error!(error = %e, "Token exchange failed");
            AuthError::Exchange(e)
        })?;

        let refresh_token = response
            .refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingRefreshToken)?;

        Ok(TokenRecord {
            access_token: response.access_token,
            refresh_token,
            expires_at: response.expires_at,
        })
    }

    /// Serve the callback route on `listener` until one redirect arrives.
    async fn capture_code(&self, listener: TcpListener) -> Result<String, AuthError> {
        let secret = self.client.client_secret().clone();
        let oauth_state =
            callback::create_state(secret.expose_secret().as_bytes()).ok_or(AuthError::StateSigning)?;

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let app = crate::routes::create_router(
            &self.callback_path,
            CallbackState::new(secret, outcome_tx),
        );
        let local_addr = listener.local_addr().map_err(AuthError::Listener)?;

        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        tracing::info!(address = %local_addr, "Callback listener started");

        let auth_url = self.client.authorize_url(&self.redirect_uri, &oauth_state);
        tracing::info!("Opening browser for authorization");
        if let Err(e) = self.browser.open(&auth_url) {
            tracing::warn!(error = %e, "Could not launch a browser");
            eprintln!("Open this URL in a browser to authorize access:\n{auth_url}");
        }

        let outcome = outcome_rx.await;

        // The handler has already produced its response; graceful shutdown
        // lets it reach the browser before the listener goes away.
        let _ = shutdown_tx.send(());
        match server.await {
            Ok(Ok(())) => tracing::debug!("Callback listener stopped"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Callback listener error"),
            Err(e) => tracing::warn!(error = %e, "Callback listener task failed"),
        }

        match outcome {
            Ok(CallbackOutcome::Code { code, scope }) => {
                if let Some(granted) = scope.as_deref() {
                    let missing: Vec<&str> = REQUIRED_SCOPES
                        .split(',')
                        .filter(|s| !granted.split(',').any(|g| g == *s))
                        .collect();
                    if !missing.is_empty() {
                        tracing::warn!(
                            granted,
                            missing = ?missing,
                            "Not all required scopes were granted"
                        );
                    }
                }
                tracing::info!("Authorization code received");
                Ok(code)
            }
            Ok(CallbackOutcome::Denied(error)) => Err(AuthError::Denied(error)),
            Ok(CallbackOutcome::MissingCode) => Err(AuthError::MissingCode),
            Err(_) => Err(AuthError::CallbackAbandoned),
        }
    }
}
