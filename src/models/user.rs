// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::UserStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitnessLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    #[default]
    Member,
    Captain,
    Coach,
}

/// Embedded team membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMembership {
    pub team_id: String,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

/// User profile stored in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// UUID (also used as document ID)
    pub id: String,
    pub username: String,
    /// Stored lower-cased
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub fitness_level: FitnessLevel,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub stats: UserStats,
    #[serde(default)]
    pub teams: Vec<TeamMembership>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whole years since birth as of `today`.
    pub fn age(&self, today: NaiveDate) -> Option<u32> {
        let dob = self.date_of_birth?;
        let mut years = today.year() - dob.year();
        if (today.month(), today.day()) < (dob.month(), dob.day()) {
            years -= 1;
        }
        u32::try_from(years).ok()
    }

    /// Body mass index rounded to one decimal.
    pub fn bmi(&self) -> Option<f64> {
        let height_m = self.height_cm? / 100.0;
        let weight = self.weight_kg?;
        if height_m <= 0.0 {
            return None;
        }
        Some((weight / (height_m * height_m) * 10.0).round() / 10.0)
    }

    /// Record a login and advance the streak.
    ///
    /// The streak follows consecutive UTC login days, not workout dates.
    pub fn record_login(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        match self.last_login.map(|t| t.date_naive()) {
            Some(last) if last == today => {}
            Some(last) if last.succ_opt() == Some(today) => self.stats.current_streak += 1,
            _ => self.stats.current_streak = 1,
        }
        self.stats.longest_streak = self.stats.longest_streak.max(self.stats.current_streak);
        self.last_login = Some(now);
        self.updated_at = now;
    }

    /// Join a team, or change the role if already a member.
    pub fn join_team(&mut self, team_id: &str, role: TeamRole, now: DateTime<Utc>) {
        if let Some(existing) = self.teams.iter_mut().find(|m| m.team_id == team_id) {
            existing.role = role;
        } else {
            self.teams.push(TeamMembership {
                team_id: team_id.to_string(),
                role,
                joined_at: now,
            });
        }
        self.updated_at = now;
    }

    /// Returns `false` if the user was not a member.
    pub fn leave_team(&mut self, team_id: &str, now: DateTime<Utc>) -> bool {
        let before = self.teams.len();
        self.teams.retain(|m| m.team_id != team_id);
        if self.teams.len() == before {
            return false;
        }
        self.updated_at = now;
        true
    }
}
