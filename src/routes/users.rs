// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile routes: profile CRUD, login streaks, team membership and
//! stat recomputation.

use super::validate;
use super::{ApiResponse, JsonBody, MessageResponse, ValidatedJson};
use crate::db::UserEdit;
use crate::error::{field_errors, AppError, FieldError, Result};
use crate::models::{FitnessLevel, Gender, TeamRole, User, UserStats};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidateEmail};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", post(create_user))
        .route(
            "/api/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/api/users/{id}/login", post(record_login))
        .route("/api/users/{id}/teams", post(join_team))
        .route("/api/users/{id}/teams/{team_id}", delete(leave_team))
        .route("/api/users/{id}/stats/recompute", post(recompute_stats))
}

// ─── Responses ───────────────────────────────────────────────

/// Stored profile plus computed fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(flatten)]
    pub user: User,
    pub full_name: String,
    pub age: Option<u32>,
    pub bmi: Option<f64>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let today = Utc::now().date_naive();
        Self {
            full_name: user.full_name(),
            age: user.age(today),
            bmi: user.bmi(),
            user,
        }
    }
}

// ─── Request Bodies ──────────────────────────────────────────

/// Profile body.
///
/// `username` and `email` are only read, and only checked, on create. See
/// [`UserInput::identity`].
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    #[validate(
        required(message = "First name is required"),
        length(min = 1, max = 50, message = "First name must be 1-50 characters"),
        custom(function = "validate::not_blank")
    )]
    pub first_name: Option<String>,
    #[validate(
        required(message = "Last name is required"),
        length(min = 1, max = 50, message = "Last name must be 1-50 characters"),
        custom(function = "validate::not_blank")
    )]
    pub last_name: Option<String>,
    #[validate(custom(function = "validate::birth_date"))]
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    #[validate(range(min = 50.0, max = 300.0, message = "Height must be between 50 and 300 cm"))]
    pub height_cm: Option<f64>,
    #[validate(range(min = 20.0, max = 500.0, message = "Weight must be between 20 and 500 kg"))]
    pub weight_kg: Option<f64>,
    pub fitness_level: Option<FitnessLevel>,
    #[serde(default)]
    #[validate(
        length(max = 20, message = "At most 20 goals"),
        custom(function = "validate::goals")
    )]
    pub goals: Vec<String>,
}

impl UserInput {
    /// Normalized `(username, email)` for a new profile.
    fn identity(&self) -> std::result::Result<(String, String), Vec<FieldError>> {
        let mut errors = Vec::new();

        let username = self.username.as_deref().map(str::trim);
        match username {
            None => errors.push(FieldError::new("username", "Username is required")),
            Some(name) => {
                if !(3..=30).contains(&name.chars().count()) {
                    errors.push(FieldError::new(
                        "username",
                        "Username must be 3-30 characters",
                    ));
                }
                if let Err(e) = validate::username(name) {
                    let message = e.message.map(|m| m.to_string()).unwrap_or_default();
                    errors.push(FieldError::new("username", message));
                }
            }
        }

        let email = self.email.as_deref().map(|e| e.trim().to_lowercase());
        match &email {
            None => errors.push(FieldError::new("email", "Email is required")),
            Some(address) if !address.validate_email() => {
                errors.push(FieldError::new("email", "Email must be valid"))
            }
            Some(_) => {}
        }

        match (username, email) {
            (Some(username), Some(email)) if errors.is_empty() => {
                Ok((username.to_string(), email))
            }
            _ => Err(errors),
        }
    }

    /// Copy the editable profile fields onto `user`.
    fn apply_profile(&self, user: &mut User) {
        let trimmed =
            |value: &Option<String>| value.as_deref().unwrap_or_default().trim().to_string();
        user.first_name = trimmed(&self.first_name);
        user.last_name = trimmed(&self.last_name);
        user.date_of_birth = self.date_of_birth;
        user.gender = self.gender;
        user.height_cm = self.height_cm;
        user.weight_kg = self.weight_kg;
        user.fitness_level = self.fitness_level.unwrap_or_default();
        user.goals = self.goals.iter().map(|g| g.trim().to_string()).collect();
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JoinTeamInput {
    #[validate(
        required(message = "Team ID is required"),
        length(min = 1, max = 64, message = "Team ID must be 1-64 characters"),
        custom(function = "validate::not_blank")
    )]
    pub team_id: Option<String>,
    pub role: Option<TeamRole>,
}

fn edit(f: impl Fn(&mut User) -> Result<()> + Send + Sync + 'static) -> UserEdit {
    Arc::new(f)
}

async fn load_user(state: &AppState, user_id: &str) -> Result<User> {
    state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
}

// ─── Profile CRUD ────────────────────────────────────────────

/// Create a profile with zeroed stats.
///
/// Profile and identity problems are reported together. The store rejects
/// a username or email that is already held.
async fn create_user(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<UserInput>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    let mut errors = input
        .validate()
        .err()
        .map(|e| field_errors(&e))
        .unwrap_or_default();
    let (username, email) = match input.identity() {
        Ok(identity) if errors.is_empty() => identity,
        Ok(_) => return Err(AppError::Validation(errors)),
        Err(identity_errors) => {
            errors.extend(identity_errors);
            return Err(AppError::Validation(errors));
        }
    };

    let now = Utc::now();
    let mut user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username,
        email,
        first_name: String::new(),
        last_name: String::new(),
        date_of_birth: None,
        gender: None,
        height_cm: None,
        weight_kg: None,
        fitness_level: FitnessLevel::default(),
        goals: vec![],
        stats: UserStats::default(),
        teams: vec![],
        last_login: None,
        created_at: now,
        updated_at: now,
    };
    input.apply_profile(&mut user);

    state.db.create_user(&user).await?;
    tracing::info!(user_id = %user.id, username = %user.username, "User created");

    Ok((StatusCode::CREATED, ApiResponse::ok(user.into())))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let user = load_user(&state, &id).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Replace profile fields. Identity, stats and teams are left alone.
async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<UserInput>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let user = state
        .db
        .modify_user(
            &id,
            edit(move |user| {
                input.apply_profile(user);
                user.updated_at = Utc::now();
                Ok(())
            }),
        )
        .await?;
    tracing::info!(user_id = %user.id, "User profile updated");

    Ok(ApiResponse::ok(user.into()))
}

#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub deleted: usize,
}

/// Delete the user and all of their workouts.
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeleteUserResponse>>> {
    load_user(&state, &id).await?;
    let deleted = state.db.delete_user_data(&id).await?;
    Ok(ApiResponse::ok(DeleteUserResponse { deleted }))
}

// ─── Login Streak ────────────────────────────────────────────

/// Record a login and advance the login streak.
async fn record_login(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let user = state
        .db
        .modify_user(
            &id,
            edit(|user| {
                user.record_login(Utc::now());
                Ok(())
            }),
        )
        .await?;

    tracing::debug!(
        user_id = %user.id,
        current_streak = user.stats.current_streak,
        "Login recorded"
    );

    Ok(ApiResponse::ok(user.into()))
}

// ─── Teams ───────────────────────────────────────────────────

async fn join_team(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<JoinTeamInput>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let team_id = input
        .team_id
        .ok_or_else(|| AppError::invalid("teamId", "Team ID is required"))?
        .trim()
        .to_string();
    let role = input.role.unwrap_or_default();

    let joined = team_id.clone();
    let user = state
        .db
        .modify_user(
            &id,
            edit(move |user| {
                user.join_team(&joined, role, Utc::now());
                Ok(())
            }),
        )
        .await?;

    tracing::info!(user_id = %user.id, team_id = %team_id, ?role, "Joined team");

    Ok(ApiResponse::ok(user.into()))
}

async fn leave_team(
    State(state): State<Arc<AppState>>,
    Path((id, team_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>> {
    let left = team_id.clone();
    let user = state
        .db
        .modify_user(
            &id,
            edit(move |user| {
                if !user.leave_team(&left, Utc::now()) {
                    return Err(AppError::NotFound(format!(
                        "User {} is not a member of team {}",
                        user.id, left
                    )));
                }
                Ok(())
            }),
        )
        .await?;

    tracing::info!(user_id = %user.id, team_id = %team_id, "Left team");

    Ok(MessageResponse::ok("Left team"))
}

// ─── Stats ───────────────────────────────────────────────────

/// Rebuild the lifetime totals from the stored workouts.
async fn recompute_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserStats>>> {
    let (before, user) = state.db.recompute_user_stats(&id).await?;

    if before != user.stats {
        tracing::warn!(
            user_id = %id,
            stored_workouts = before.total_workouts,
            actual_workouts = user.stats.total_workouts,
            "Stat totals had drifted; recomputed"
        );
    }

    Ok(ApiResponse::ok(user.stats))
}
