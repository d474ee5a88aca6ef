// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod stats;
pub mod user;
pub mod workout;

pub use stats::{StatDelta, UserStats, WorkoutChange};
pub use user::{FitnessLevel, Gender, TeamMembership, TeamRole, User};
pub use workout::{Exercise, Intensity, Workout, WorkoutQuery, WorkoutType};
