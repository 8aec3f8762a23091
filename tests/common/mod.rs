// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use strava_feed_hider::config::Config;
use strava_feed_hider::db::TokenStore;
use strava_feed_hider::models::TokenRecord;
use strava_feed_hider::services::{AuthorizationFlow, BrowserOpener, StravaClient, TokenManager};
use wiremock::MockServer;

pub const TOKEN_PATH: &str = "/oauth/token";

/// Config pointing at a mock Strava and a token file inside `dir`.
#[allow(dead_code)]
pub fn test_config(server: &MockServer, dir: &Path) -> Config {
    Config {
        redirect_uri: format!("http://127.0.0.1:{}/callback", free_local_port()),
        token_file: dir.join("strava_token.json"),
        api_base_url: format!("{}/api/v3", server.uri()),
        oauth_base_url: format!("{}/oauth", server.uri()),
        ..Config::default()
    }
}

/// A local port that was free a moment ago.
#[allow(dead_code)]
pub fn free_local_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind ephemeral port")
        .local_addr()
        .unwrap()
        .port()
}

#[allow(dead_code)]
pub fn token_manager(config: &Config, browser: impl BrowserOpener + 'static) -> TokenManager {
    let client = StravaClient::from_config(config);
    let flow = AuthorizationFlow::new(config, client.clone(), Box::new(browser))
        .expect("valid redirect uri");
    TokenManager::new(client, TokenStore::new(&config.token_file), flow)
}

#[allow(dead_code)]
pub fn record(access: &str, refresh: &str, expires_at: i64) -> TokenRecord {
    TokenRecord {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_at,
    }
}

#[allow(dead_code)]
pub async fn seed_token(config: &Config, record: &TokenRecord) {
    TokenStore::new(&config.token_file)
        .save(record)
        .await
        .expect("seed token file");
}

#[allow(dead_code)]
pub fn read_token_file(config: &Config) -> serde_json::Value {
    let raw = std::fs::read_to_string(&config.token_file).expect("token file exists");
    serde_json::from_str(&raw).expect("token file is JSON")
}

/// Browser stand-in for runs that must never reach the interactive flow.
#[allow(dead_code)]
pub struct UnreachableBrowser;

impl BrowserOpener for UnreachableBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        panic!("authorization flow should not run, tried to open {url}");
    }
}

/// Plays the part of the user and Strava: follows the authorization URL
/// straight back to the redirect URI with the given query parameters
/// (plus the `state` Strava echoes).
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct RedirectingBrowser {
    params: Vec<(String, String)>,
    pub opened: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl RedirectingBrowser {
    pub fn with_code(code: &str) -> Self {
        Self::with_params(&[("code", code), ("scope", "read,activity:write,activity:read_all")])
    }

    pub fn with_params(params: &[(&str, &str)]) -> Self {
        Self {
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            opened: Arc::default(),
        }
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl BrowserOpener for RedirectingBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        self.opened.lock().unwrap().push(url.to_string());

        let authorize = reqwest::Url::parse(url).map_err(io::Error::other)?;
        let query: HashMap<String, String> = authorize.query_pairs().into_owned().collect();

        let mut callback =
            reqwest::Url::parse(&query["redirect_uri"]).map_err(io::Error::other)?;
        {
            let mut pairs = callback.query_pairs_mut();
            pairs.append_pair("state", &query["state"]);
            for (k, v) in &self.params {
                pairs.append_pair(k, v);
            }
        }

        tokio::spawn(async move {
            let response = reqwest::get(callback).await.expect("callback reachable");
            assert!(
                response.headers().get("referrer-policy").is_some(),
                "callback page should carry security headers"
            );
        });
        Ok(())
    }
}
