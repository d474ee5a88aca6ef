// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! DanielSport: workout tracking backend
//!
//! This crate provides the REST API for logging workouts, keeping each
//! user's lifetime totals in step with their workout records, and
//! summarizing training over time.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use db::Store;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Store>,
}
