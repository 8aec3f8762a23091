// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! strava-feed-hider: keep freshly uploaded Strava activities out of the
//! home feed.
//!
//! A periodic job that obtains an OAuth access token (authorizing
//! interactively the first time, refreshing afterwards), lists the
//! athlete's recent activities and sets `hide_from_home` on each one that
//! isn't hidden yet.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
