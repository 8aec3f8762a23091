// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - job logic layer.

pub mod activity;
pub mod authorize;
pub mod job;
pub mod strava;
pub mod token_manager;

pub use activity::{ActivityFetcher, ActivityUpdater};
pub use authorize::{AuthorizationFlow, BrowserOpener, SystemBrowser};
pub use job::{Job, JobSummary};
pub use strava::StravaClient;
pub use token_manager::TokenManager;
