// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava hide-from-home-feed job
//!
//! Meant to be run periodically (cron, systemd timer). The first run needs
//! a browser to authorize access; later runs refresh the stored token.

use anyhow::Context;
use std::process::ExitCode;
use strava_feed_hider::{
    config::Config,
    services::{Job, JobSummary, SystemBrowser},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize structured JSON logging
    init_logging();
    tracing::info!("Starting Strava hide from home feed job");

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            eprintln!("ERROR: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        lookback_minutes = config.lookback_minutes,
        token_file = %config.token_file.display(),
        "Credentials validated successfully"
    );

    match run(&config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Error in job");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config) -> anyhow::Result<JobSummary> {
    let job = Job::from_config(config, Box::new(SystemBrowser))
        .context("failed to set up job")?;

    job.run().await.context("hide-from-feed job failed")
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,strava_feed_hider=info")),
        )
        .with(format)
        .init();
}
