// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout aggregation.
//!
//! Groupings are recomputed from the workouts in the requested window on
//! every call; nothing here is materialized.

use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;
use serde::Serialize;

use crate::models::{Workout, WorkoutType};
use crate::time_utils::date_key;

/// Overall totals and averages for a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryTotals {
    pub total_workouts: u32,
    pub total_duration: u64,
    pub total_calories: u64,
    pub avg_duration: f64,
    /// Averaged over the workouts that report calories.
    pub avg_calories: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    pub count: u32,
}

/// Count of workouts in one ISO 8601 week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekCount {
    pub year: i32,
    pub week: u32,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSummary {
    pub summary: SummaryTotals,
    pub by_type: Vec<TypeCount>,
    pub weekly: Vec<WeekCount>,
}

/// Run all three groupings over `workouts`.
pub fn summarize(workouts: &[Workout]) -> WorkoutSummary {
    WorkoutSummary {
        summary: totals(workouts),
        by_type: counts_by_type(workouts),
        weekly: counts_by_week(workouts),
    }
}

pub fn totals(workouts: &[Workout]) -> SummaryTotals {
    let total_workouts = workouts.len() as u32;
    let total_duration: u64 = workouts.iter().map(|w| u64::from(w.duration)).sum();

    let reported: Vec<u64> = workouts
        .iter()
        .filter_map(|w| w.calories_burned.map(u64::from))
        .collect();
    let total_calories: u64 = reported.iter().sum();

    SummaryTotals {
        total_workouts,
        total_duration,
        total_calories,
        avg_duration: average(total_duration, workouts.len()),
        avg_calories: average(total_calories, reported.len()),
    }
}

fn average(sum: u64, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        sum as f64 / n as f64
    }
}

/// Workout count per type, most frequent first.
pub fn counts_by_type(workouts: &[Workout]) -> Vec<TypeCount> {
    let mut counts: HashMap<WorkoutType, u32> = HashMap::new();
    for w in workouts {
        *counts.entry(w.workout_type).or_insert(0) += 1;
    }

    let mut by_type: Vec<TypeCount> = counts
        .into_iter()
        .map(|(workout_type, count)| TypeCount {
            workout_type,
            count,
        })
        .collect();
    by_type.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.workout_type.as_str().cmp(b.workout_type.as_str()))
    });
    by_type
}

/// Workout count per ISO year/week, oldest week first.
pub fn counts_by_week(workouts: &[Workout]) -> Vec<WeekCount> {
    let mut weeks: BTreeMap<(i32, u32), u32> = BTreeMap::new();
    for w in workouts {
        let iso = w.date.iso_week();
        *weeks.entry((iso.year(), iso.week())).or_insert(0) += 1;
    }

    weeks
        .into_iter()
        .map(|((year, week), count)| WeekCount { year, week, count })
        .collect()
}

/// Group workouts by UTC calendar day, each day in chronological order.
pub fn group_by_day(mut workouts: Vec<Workout>) -> BTreeMap<String, Vec<Workout>> {
    workouts.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

    let mut days: BTreeMap<String, Vec<Workout>> = BTreeMap::new();
    for w in workouts {
        days.entry(date_key(w.date)).or_default().push(w);
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_workout(
        id: &str,
        t: WorkoutType,
        (y, m, d): (i32, u32, u32),
        duration: u32,
        calories: Option<u32>,
    ) -> Workout {
        let date = Utc.with_ymd_and_hms(y, m, d, 7, 30, 0).unwrap();
        Workout {
            id: id.to_string(),
            user_id: "u1".to_string(),
            name: format!("Workout {}", id),
            workout_type: t,
            date,
            duration,
            calories_burned: calories,
            intensity: None,
            exercises: vec![],
            notes: None,
            created_at: date,
            updated_at: date,
        }
    }

    #[test]
    fn test_totals_and_averages() {
        let workouts = vec![
            make_workout("a", WorkoutType::Cardio, (2024, 1, 2), 30, Some(200)),
            make_workout("b", WorkoutType::Strength, (2024, 1, 3), 60, Some(400)),
            make_workout("c", WorkoutType::Cardio, (2024, 1, 4), 30, None),
        ];

        let t = totals(&workouts);
        assert_eq!(t.total_workouts, 3);
        assert_eq!(t.total_duration, 120);
        assert_eq!(t.total_calories, 600);
        assert_eq!(t.avg_duration, 40.0);
        // Workout without calories does not drag the average down
        assert_eq!(t.avg_calories, 300.0);
    }

    #[test]
    fn test_empty_window_is_zeroed() {
        let s = summarize(&[]);
        assert_eq!(s.summary, SummaryTotals::default());
        assert!(s.by_type.is_empty());
        assert!(s.weekly.is_empty());
    }

    #[test]
    fn test_counts_by_type_sorted_by_count() {
        let workouts = vec![
            make_workout("a", WorkoutType::Strength, (2024, 1, 2), 30, None),
            make_workout("b", WorkoutType::Cardio, (2024, 1, 3), 30, None),
            make_workout("c", WorkoutType::Hiit, (2024, 1, 4), 30, None),
            make_workout("d", WorkoutType::Hiit, (2024, 1, 5), 30, None),
        ];

        let by_type = counts_by_type(&workouts);
        assert_eq!(
            by_type,
            vec![
                TypeCount {
                    workout_type: WorkoutType::Hiit,
                    count: 2
                },
                TypeCount {
                    workout_type: WorkoutType::Cardio,
                    count: 1
                },
                TypeCount {
                    workout_type: WorkoutType::Strength,
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_weekly_buckets_use_iso_weeks() {
        // 2024-12-30 falls in ISO week 1 of 2025; 2024-12-29 is week 52 of 2024.
        let workouts = vec![
            make_workout("a", WorkoutType::Cardio, (2024, 12, 30), 30, None),
            make_workout("b", WorkoutType::Cardio, (2024, 12, 29), 30, None),
            make_workout("c", WorkoutType::Cardio, (2025, 1, 2), 30, None),
        ];

        let weekly = counts_by_week(&workouts);
        assert_eq!(
            weekly,
            vec![
                WeekCount {
                    year: 2024,
                    week: 52,
                    count: 1
                },
                WeekCount {
                    year: 2025,
                    week: 1,
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn test_group_by_day() {
        let workouts = vec![
            make_workout("b", WorkoutType::Cardio, (2024, 3, 5), 30, None),
            make_workout("a", WorkoutType::Strength, (2024, 3, 5), 45, None),
            make_workout("c", WorkoutType::Cardio, (2024, 3, 1), 20, None),
        ];

        let days = group_by_day(workouts);
        let keys: Vec<_> = days.keys().cloned().collect();
        assert_eq!(keys, vec!["2024-03-01", "2024-03-05"]);
        let ids: Vec<_> = days["2024-03-05"].iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let workouts = vec![make_workout(
            "a",
            WorkoutType::Cardio,
            (2024, 1, 2),
            30,
            Some(200),
        )];
        let json = serde_json::to_value(summarize(&workouts)).unwrap();
        assert_eq!(json["summary"]["totalWorkouts"], 1);
        assert_eq!(json["byType"][0]["type"], "cardio");
        assert_eq!(json["weekly"][0]["week"], 1);
    }
}
