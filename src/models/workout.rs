// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed set of workout categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    Cardio,
    Strength,
    Flexibility,
    Hiit,
    Sports,
    Other,
}

impl WorkoutType {
    pub const ALL: [WorkoutType; 6] = [
        WorkoutType::Cardio,
        WorkoutType::Strength,
        WorkoutType::Flexibility,
        WorkoutType::Hiit,
        WorkoutType::Sports,
        WorkoutType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutType::Cardio => "cardio",
            WorkoutType::Strength => "strength",
            WorkoutType::Flexibility => "flexibility",
            WorkoutType::Hiit => "hiit",
            WorkoutType::Sports => "sports",
            WorkoutType::Other => "other",
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkoutType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Type must be one of: {}",
                    WorkoutType::ALL
                        .iter()
                        .map(|t| t.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Moderate,
    High,
}

/// One exercise inside a workout. Independent of the workout's own
/// duration and calories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    #[serde(default)]
    pub sets: Option<u32>,
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    /// Minutes
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Stored workout document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    /// UUID (also used as document ID)
    pub id: String,
    /// Owning user ID
    pub user_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    pub date: DateTime<Utc>,
    /// Minutes
    pub duration: u32,
    #[serde(default)]
    pub calories_burned: Option<u32>,
    #[serde(default)]
    pub intensity: Option<Intensity>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workout {
    /// Calories counted toward totals (absent counts as zero).
    pub fn calories(&self) -> u32 {
        self.calories_burned.unwrap_or(0)
    }
}

/// Filter for listing a user's workouts.
///
/// Both date bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct WorkoutQuery {
    pub workout_type: Option<WorkoutType>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl WorkoutQuery {
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            workout_type: None,
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn matches(&self, workout: &Workout) -> bool {
        if let Some(t) = self.workout_type {
            if workout.workout_type != t {
                return false;
            }
        }
        if let Some(start) = self.start {
            if workout.date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if workout.date > end {
                return false;
            }
        }
        true
    }
}

/// Newest first; ties broken by id so paging is stable.
pub fn sort_newest_first(workouts: &mut [Workout]) {
    workouts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
}
