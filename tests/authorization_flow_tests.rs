// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interactive authorization flow against a mock Strava.
//!
//! The "browser" follows the authorization URL straight back to the local
//! callback listener, the way Strava redirects after the user approves.

use reqwest::Url;
use serde_json::json;
use std::collections::HashMap;
use strava_feed_hider::error::AuthError;
use strava_feed_hider::services::{AuthorizationFlow, StravaClient};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{test_config, token_manager, RedirectingBrowser, TOKEN_PATH};

fn flow(config: &strava_feed_hider::config::Config, browser: RedirectingBrowser) -> AuthorizationFlow {
    let client = StravaClient::from_config(config);
    AuthorizationFlow::new(config, client, Box::new(browser)).unwrap()
}

#[tokio::test]
async fn test_code_is_exchanged_for_token_record() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, dir.path());

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("code=abc123"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "refresh_token": "R1",
            "expires_at": 1_700_021_600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let browser = RedirectingBrowser::with_code("abc123");
    let record = flow(&config, browser.clone()).run().await.unwrap();

    assert_eq!(record, common::record("T1", "R1", 1_700_021_600));

    // The authorization URL asks for the scopes we need and the configured redirect.
    let opened = browser.opened_urls();
    assert_eq!(opened.len(), 1);
    let url = Url::parse(&opened[0]).unwrap();
    assert_eq!(url.path(), "/oauth/authorize");
    let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
    assert_eq!(query["client_id"], "test_client_id");
    assert_eq!(query["redirect_uri"], config.redirect_uri);
    assert_eq!(query["response_type"], "code");
    assert_eq!(query["scope"], "activity:write,activity:read_all");
    assert!(!query["state"].is_empty());
}

#[tokio::test]
async fn test_listener_is_stopped_after_callback() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, dir.path());

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "refresh_token": "R1",
            "expires_at": 1_700_021_600
        })))
        .mount(&server)
        .await;

    flow(&config, RedirectingBrowser::with_code("abc123"))
        .run()
        .await
        .unwrap();

    let addr = config.callback_bind_addr().unwrap();
    assert!(
        tokio::net::TcpStream::connect(addr).await.is_err(),
        "callback listener should be closed"
    );
}

#[tokio::test]
async fn test_callback_without_code_fails() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, dir.path());

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = flow(&config, RedirectingBrowser::with_params(&[]))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::MissingCode));
}

#[tokio::test]
async fn test_user_denial_fails() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, dir.path());

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = flow(
        &config,
        RedirectingBrowser::with_params(&[("error", "access_denied")]),
    )
    .run()
    .await
    .unwrap_err();

    assert!(matches!(err, AuthError::Denied(ref e) if e == "access_denied"));
}

#[tokio::test]
async fn test_exchange_failure_is_fatal_and_nothing_is_saved() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, dir.path());

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Bad Request",
            "errors": [{"resource": "AuthorizationCode", "field": "code", "code": "invalid"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = token_manager(&config, RedirectingBrowser::with_code("stale"));
    let err = manager.get_access_token().await.unwrap_err();

    assert!(matches!(err, AuthError::Exchange(_)));
    assert!(!config.token_file.exists());
}

#[tokio::test]
async fn test_occupied_port_is_listener_error() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, dir.path());

    let _occupied = tokio::net::TcpListener::bind(config.callback_bind_addr().unwrap())
        .await
        .unwrap();

    let err = flow(&config, RedirectingBrowser::with_code("abc123"))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Listener(_)));
}
