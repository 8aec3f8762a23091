// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Per-activity results of a job run.

use crate::error::UpdateError;
use serde::Serialize;

/// Identifies an activity in logs and the job summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRef {
    /// Strava activity ID
    pub id: u64,
    /// Activity name/title
    pub name: String,
}

/// What happened when we tried to hide one activity.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// Already hidden, no write issued
    AlreadyHidden,
    /// Flag was set by this run
    NewlyHidden,
    Failed(UpdateError),
}

impl UpdateOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, UpdateOutcome::Failed(_))
    }
}
