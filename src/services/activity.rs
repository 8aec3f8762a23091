// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recent activity discovery and the idempotent hide step.
//!
//! Only the first page of the athlete's activities is read. If more than a
//! page of activities started inside the lookback window, the older ones in
//! the window are missed; the next scheduled run will not see them either.

use crate::error::{FetchError, UpdateError};
use crate::models::UpdateOutcome;
use crate::services::strava::{StravaActivitySummary, StravaClient};
use crate::time_utils::{format_utc_rfc3339, parse_strava_timestamp};
use chrono::{DateTime, Duration, Utc};

/// Activities requested per run.
pub const ACTIVITY_PAGE_SIZE: u32 = 30;

/// Lists the athlete's recently started activities.
pub struct ActivityFetcher {
    client: StravaClient,
    per_page: u32,
}

impl ActivityFetcher {
    pub fn new(client: StravaClient) -> Self {
        Self {
            client,
            per_page: ACTIVITY_PAGE_SIZE,
        }
    }

    pub async fn list_recent(
        &self,
        access_token: &str,
        lookback_minutes: u32,
    ) -> Result<Vec<StravaActivitySummary>, FetchError> {
        self.list_recent_at(access_token, lookback_minutes, Utc::now())
            .await
    }

    pub async fn list_recent_at(
        &self,
        access_token: &str,
        lookback_minutes: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<StravaActivitySummary>, FetchError> {
        let activities = self
            .client
            .list_activities(access_token, 1, self.per_page)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to retrieve activities");
                FetchError::Api(e)
            })?;

        let cutoff = lookback_cutoff(now, lookback_minutes);
        tracing::info!(
            now = %format_utc_rfc3339(now),
            cutoff = %format_utc_rfc3339(cutoff),
            fetched = activities.len(),
            "Filtering activities by start time"
        );

        let recent = filter_recent(activities, cutoff)?;
        tracing::info!(
            count = recent.len(),
            lookback_minutes,
            "Found recent activities"
        );
        Ok(recent)
    }
}

/// Earliest start time still considered recent.
pub fn lookback_cutoff(now: DateTime<Utc>, lookback_minutes: u32) -> DateTime<Utc> {
    now - Duration::minutes(i64::from(lookback_minutes))
}

/// Keep activities that started at or after `cutoff`, in the given order.
pub fn filter_recent(
    activities: Vec<StravaActivitySummary>,
    cutoff: DateTime<Utc>,
) -> Result<Vec<StravaActivitySummary>, FetchError> {
    let mut recent = Vec::new();
    for activity in activities {
        let started = parse_strava_timestamp(&activity.start_date).ok_or_else(|| {
            FetchError::InvalidTimestamp {
                id: activity.id,
                value: activity.start_date.clone(),
            }
        })?;
        if started >= cutoff {
            recent.push(activity);
        }
    }
    Ok(recent)
}

/// Sets `hide_from_home` on activities that don't have it yet.
pub struct ActivityUpdater {
    client: StravaClient,
}

impl ActivityUpdater {
    pub fn new(client: StravaClient) -> Self {
        Self { client }
    }

    /// Make sure an activity is hidden from the home feed.
    ///
    /// Reads the activity first and skips the write when the flag is already
    /// set, so repeated runs cost one GET per activity and no PUTs.
    pub async fn ensure_hidden(&self, activity_id: u64, access_token: &str) -> UpdateOutcome {
        match self.try_hide(activity_id, access_token).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(activity_id, error = %e, "Failed to hide activity");
                UpdateOutcome::Failed(e)
            }
        }
    }

    async fn try_hide(
        &self,
        activity_id: u64,
        access_token: &str,
    ) -> Result<UpdateOutcome, UpdateError> {
        let detail = self
            .client
            .get_activity(access_token, activity_id)
            .await
            .map_err(|source| UpdateError::Fetch {
                id: activity_id,
                source,
            })?;

        if detail.hide_from_home {
            tracing::info!(activity_id, "Activity is already excluded from home feed");
            return Ok(UpdateOutcome::AlreadyHidden);
        }

        self.client
            .hide_activity(access_token, activity_id)
            .await
            .map_err(|source| UpdateError::Write {
                id: activity_id,
                source,
            })?;

        tracing::info!(activity_id, "Successfully updated activity");
        Ok(UpdateOutcome::NewlyHidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: u64, start_date: &str) -> StravaActivitySummary {
        StravaActivitySummary {
            id,
            name: format!("Activity {id}"),
            sport_type: Some("Ride".to_string()),
            start_date: start_date.to_string(),
        }
    }

    fn at(value: &str) -> DateTime<Utc> {
        parse_strava_timestamp(value).unwrap()
    }

    #[test]
    fn test_lookback_cutoff() {
        let now = at("2026-03-01T12:00:00Z");
        assert_eq!(lookback_cutoff(now, 60), at("2026-03-01T11:00:00Z"));
        assert_eq!(lookback_cutoff(now, 0), now);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let cutoff = at("2026-03-01T11:00:00Z");
        let activities = vec![
            summary(1, "2026-03-01T11:00:00Z"),
            summary(2, "2026-03-01T10:59:59Z"),
        ];

        let recent = filter_recent(activities, cutoff).unwrap();
        let ids: Vec<u64> = recent.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_filter_keeps_api_order() {
        let cutoff = at("2026-03-01T07:00:00Z");
        let activities = vec![
            summary(3, "2026-03-01T09:00:00Z"),
            summary(1, "2026-03-01T11:30:00Z"),
            summary(2, "2026-02-28T09:00:00Z"),
            summary(4, "2026-03-01T08:00:00Z"),
        ];

        let ids: Vec<u64> = filter_recent(activities, cutoff)
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![3, 1, 4]);
    }

    #[test]
    fn test_filter_rejects_malformed_timestamp() {
        let cutoff = at("2026-03-01T07:00:00Z");
        let err = filter_recent(vec![summary(9, "yesterday")], cutoff).unwrap_err();
        assert!(matches!(err, FetchError::InvalidTimestamp { id: 9, .. }));
    }
}
