// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Job driver: token → recent activities → hide each → summary.
//!
//! Auth and fetch failures abort the run. A failure on one activity is
//! logged, counted, and the remaining activities are still processed.

use crate::config::Config;
use crate::db::TokenStore;
use crate::error::{ConfigError, Result};
use crate::models::{ActivityRef, UpdateOutcome};
use crate::services::activity::{ActivityFetcher, ActivityUpdater};
use crate::services::authorize::{AuthorizationFlow, BrowserOpener};
use crate::services::strava::StravaClient;
use crate::services::token_manager::TokenManager;
use serde::Serialize;

/// One run of the hide-from-feed job.
pub struct Job {
    tokens: TokenManager,
    fetcher: ActivityFetcher,
    updater: ActivityUpdater,
    lookback_minutes: u32,
}

impl Job {
    pub fn new(
        tokens: TokenManager,
        fetcher: ActivityFetcher,
        updater: ActivityUpdater,
        lookback_minutes: u32,
    ) -> Self {
        Self {
            tokens,
            fetcher,
            updater,
            lookback_minutes,
        }
    }

    /// Wire up all components from configuration.
    pub fn from_config(
        config: &Config,
        browser: Box<dyn BrowserOpener>,
    ) -> std::result::Result<Self, ConfigError> {
        let client = StravaClient::from_config(config);
        let flow = AuthorizationFlow::new(config, client.clone(), browser)?;
        let tokens = TokenManager::new(client.clone(), TokenStore::new(&config.token_file), flow);

        Ok(Self::new(
            tokens,
            ActivityFetcher::new(client.clone()),
            ActivityUpdater::new(client),
            config.lookback_minutes,
        ))
    }

    /// Run the job once and return what happened to each activity.
    pub async fn run(&self) -> Result<JobSummary> {
        let access_token = self.tokens.get_access_token().await?;

        let activities = self
            .fetcher
            .list_recent(&access_token, self.lookback_minutes)
            .await?;

        let mut summary = JobSummary {
            found: activities.len(),
            ..JobSummary::default()
        };

        if activities.is_empty() {
            tracing::info!("No recent activities found to process");
            return Ok(summary);
        }

        for activity in activities {
            tracing::info!(
                activity_id = activity.id,
                name = %activity.name,
                "Processing activity"
            );

            let outcome = self.updater.ensure_hidden(activity.id, &access_token).await;
            summary.record(
                ActivityRef {
                    id: activity.id,
                    name: activity.name,
                },
                &outcome,
            );
        }

        summary.log();
        Ok(summary)
    }
}

/// Result of a job run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct JobSummary {
    /// Activities inside the lookback window
    pub found: usize,
    pub already_hidden: Vec<ActivityRef>,
    pub newly_hidden: Vec<ActivityRef>,
    pub failed: Vec<ActivityRef>,
}

impl JobSummary {
    pub fn record(&mut self, activity: ActivityRef, outcome: &UpdateOutcome) {
        match outcome {
            UpdateOutcome::AlreadyHidden => {
                tracing::info!(
                    activity_id = activity.id,
                    name = %activity.name,
                    "Activity already excluded from home feed"
                );
                self.already_hidden.push(activity);
            }
            UpdateOutcome::NewlyHidden => {
                tracing::info!(
                    activity_id = activity.id,
                    name = %activity.name,
                    "Activity newly excluded from home feed"
                );
                self.newly_hidden.push(activity);
            }
            UpdateOutcome::Failed(_) => self.failed.push(activity),
        }
    }

    pub fn log(&self) {
        tracing::info!(
            found = self.found,
            already_excluded = self.already_hidden.len(),
            newly_excluded = self.newly_hidden.len(),
            failed = self.failed.len(),
            "Job completed"
        );

        for (label, list) in [
            ("already_excluded", &self.already_hidden),
            ("newly_excluded", &self.newly_hidden),
            ("failed", &self.failed),
        ] {
            for activity in list {
                tracing::info!(
                    status = label,
                    activity_id = activity.id,
                    name = %activity.name,
                    "Summary entry"
                );
            }
        }

        if self.already_hidden.is_empty() && self.newly_hidden.is_empty() {
            tracing::info!("No activities were excluded");
        }
    }
}
