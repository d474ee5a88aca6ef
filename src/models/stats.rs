//! Lifetime user statistics and the deltas that keep them in step with
//! workout records.
//!
//! Every workout write is expressed as a [`WorkoutChange`]; the store applies
//! the change's [`StatDelta`] to the owner in the same transaction as the
//! workout write itself.

use serde::{Deserialize, Serialize};

use crate::models::Workout;

/// Aggregates embedded in the user document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    #[serde(default)]
    pub total_workouts: u32,
    /// Minutes
    #[serde(default)]
    pub total_duration: u64,
    #[serde(default)]
    pub total_calories_burned: u64,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
}

/// Signed change to the three running totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatDelta {
    pub workouts: i64,
    pub duration: i64,
    pub calories: i64,
}

impl UserStats {
    /// Apply a delta, clamping at zero.
    pub fn apply(&mut self, delta: StatDelta) {
        self.total_workouts = clamp_add(self.total_workouts as i64, delta.workouts) as u32;
        self.total_duration = clamp_add(self.total_duration as i64, delta.duration) as u64;
        self.total_calories_burned =
            clamp_add(self.total_calories_burned as i64, delta.calories) as u64;
    }

    /// Replace the totals with sums over `workouts`. Streaks are untouched.
    pub fn recompute_totals<'a>(&mut self, workouts: impl IntoIterator<Item = &'a Workout>) {
        let mut count = 0u32;
        let mut duration = 0u64;
        let mut calories = 0u64;
        for w in workouts {
            count += 1;
            duration += u64::from(w.duration);
            calories += u64::from(w.calories());
        }
        self.total_workouts = count;
        self.total_duration = duration;
        self.total_calories_burned = calories;
    }
}

fn clamp_add(value: i64, delta: i64) -> i64 {
    value.saturating_add(delta).max(0)
}

/// A workout mutation paired with the stat bookkeeping it implies.
#[derive(Debug, Clone)]
pub enum WorkoutChange {
    Created(Workout),
    Updated { previous: Workout, current: Workout },
    Deleted(Workout),
}

impl WorkoutChange {
    pub fn user_id(&self) -> &str {
        match self {
            WorkoutChange::Created(w) | WorkoutChange::Deleted(w) => &w.user_id,
            WorkoutChange::Updated { current, .. } => &current.user_id,
        }
    }

    pub fn workout_id(&self) -> &str {
        match self {
            WorkoutChange::Created(w) | WorkoutChange::Deleted(w) => &w.id,
            WorkoutChange::Updated { current, .. } => &current.id,
        }
    }

    pub fn delta(&self) -> StatDelta {
        match self {
            WorkoutChange::Created(w) => StatDelta {
                workouts: 1,
                duration: i64::from(w.duration),
                calories: i64::from(w.calories()),
            },
            WorkoutChange::Updated { previous, current } => StatDelta {
                workouts: 0,
                duration: i64::from(current.duration) - i64::from(previous.duration),
                calories: i64::from(current.calories()) - i64::from(previous.calories()),
            },
            WorkoutChange::Deleted(w) => StatDelta {
                workouts: -1,
                duration: -i64::from(w.duration),
                calories: -i64::from(w.calories()),
            },
        }
    }
}
