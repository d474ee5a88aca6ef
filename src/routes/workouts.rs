// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout routes for the calling user.

use super::validate;
use super::{ApiResponse, MessageResponse, Pagination, ValidatedJson, ValidatedQuery};
use crate::error::{AppError, FieldError, Result};
use crate::middleware::CurrentUser;
use crate::models::{Exercise, Intensity, Workout, WorkoutChange, WorkoutQuery, WorkoutType};
use crate::services::{stats, summarize, WorkoutSummary};
use crate::time_utils::{month_bounds, parse_date_param, to_stored_precision, DayBound};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use validator::Validate;

const DEFAULT_LIMIT: u32 = 10;
const DEFAULT_PERIOD_DAYS: u32 = 30;

/// Workout routes (require `X-User-Id`).
/// The identity middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/workouts", get(list_workouts).post(create_workout))
        .route(
            "/api/workouts/{id}",
            get(get_workout).put(update_workout).delete(delete_workout),
        )
        .route("/api/workouts/stats/summary", get(get_summary))
        .route("/api/workouts/calendar/{year}/{month}", get(get_calendar))
}

// ─── Request Bodies ──────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseInput {
    #[validate(
        required(message = "Exercise name is required"),
        length(min = 1, max = 100, message = "Exercise name must be 1-100 characters"),
        custom(function = "validate::not_blank")
    )]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 100, message = "Sets must be between 1 and 100"))]
    pub sets: Option<u32>,
    #[validate(range(min = 1, max = 1000, message = "Reps must be between 1 and 1000"))]
    pub reps: Option<u32>,
    #[validate(range(min = 0.0, max = 1000.0, message = "Weight must be between 0 and 1000 kg"))]
    pub weight_kg: Option<f64>,
    #[validate(range(max = 1440, message = "Exercise duration must be at most 1440 minutes"))]
    pub duration: Option<u32>,
    #[validate(range(min = 0.0, max = 1000.0, message = "Distance must be between 0 and 1000 km"))]
    pub distance_km: Option<f64>,
    #[validate(length(max = 500, message = "Exercise notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

impl ExerciseInput {
    fn into_exercise(self) -> Exercise {
        Exercise {
            name: self.name.unwrap_or_default().trim().to_string(),
            sets: self.sets,
            reps: self.reps,
            weight_kg: self.weight_kg,
            duration: self.duration,
            distance_km: self.distance_km,
            notes: self.notes,
        }
    }
}

/// Body for create and full-replace update.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutInput {
    #[validate(
        required(message = "Workout name is required"),
        length(min = 1, max = 100, message = "Workout name must be 1-100 characters"),
        custom(function = "validate::not_blank")
    )]
    pub name: Option<String>,
    #[serde(rename = "type")]
    #[validate(
        required(message = "Workout type is required"),
        custom(function = "validate::workout_type")
    )]
    pub workout_type: Option<String>,
    #[validate(custom(function = "validate::date_param"))]
    pub date: Option<String>,
    #[validate(
        required(message = "Duration is required"),
        range(min = 1, max = 1440, message = "Duration must be between 1 and 1440 minutes")
    )]
    pub duration: Option<u32>,
    #[validate(range(max = 10000, message = "Calories must be between 0 and 10000"))]
    pub calories_burned: Option<u32>,
    pub intensity: Option<Intensity>,
    #[serde(default)]
    #[validate(length(max = 50, message = "At most 50 exercises per workout"), nested)]
    pub exercises: Vec<ExerciseInput>,
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

impl WorkoutInput {
    /// Build the stored document. `fallback_date` is used when no date was sent.
    fn into_workout(
        self,
        id: String,
        user_id: String,
        fallback_date: DateTime<Utc>,
        created_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Workout> {
        let name = self
            .name
            .ok_or_else(|| AppError::invalid("name", "Workout name is required"))?;
        let workout_type: WorkoutType = self
            .workout_type
            .ok_or_else(|| AppError::invalid("type", "Workout type is required"))?
            .parse()
            .map_err(|msg: String| AppError::invalid("type", msg))?;
        let duration = self
            .duration
            .ok_or_else(|| AppError::invalid("duration", "Duration is required"))?;
        let date = match self.date.as_deref() {
            Some(raw) => parse_date_param(raw, DayBound::Start)
                .ok_or_else(|| AppError::invalid("date", "Must be a valid date"))?,
            None => fallback_date,
        };

        Ok(Workout {
            id,
            user_id,
            name: name.trim().to_string(),
            workout_type,
            date: to_stored_precision(date),
            duration,
            calories_burned: self.calories_burned,
            intensity: self.intensity,
            exercises: self
                .exercises
                .into_iter()
                .map(ExerciseInput::into_exercise)
                .collect(),
            notes: self.notes,
            created_at: to_stored_precision(created_at),
            updated_at: to_stored_precision(now),
        })
    }
}

// ─── List ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(rename = "type")]
    #[validate(custom(function = "validate::workout_type"))]
    pub workout_type: Option<String>,
    #[validate(custom(function = "validate::date_param"))]
    pub start_date: Option<String>,
    #[validate(custom(function = "validate::date_param"))]
    pub end_date: Option<String>,
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be greater than 0"))]
    pub page: u32,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}
fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl ListQuery {
    fn to_filter(&self) -> Result<WorkoutQuery> {
        let workout_type = self
            .workout_type
            .as_deref()
            .map(str::parse::<WorkoutType>)
            .transpose()
            .map_err(|msg| AppError::invalid("type", msg))?;
        let start = self
            .start_date
            .as_deref()
            .and_then(|raw| parse_date_param(raw, DayBound::Start));
        let end = self
            .end_date
            .as_deref()
            .and_then(|raw| parse_date_param(raw, DayBound::End));

        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(AppError::invalid(
                    "endDate",
                    "End date must not be before start date",
                ));
            }
        }

        Ok(WorkoutQuery {
            workout_type,
            start,
            end,
        })
    }
}

/// Slice one page out of a full result list.
fn paginate<T>(items: Vec<T>, page: u32, limit: u32) -> (Vec<T>, Pagination) {
    let total = items.len() as u32;
    let pages = total.div_ceil(limit);
    let start = (page as usize - 1).saturating_mul(limit as usize);

    let data = items
        .into_iter()
        .skip(start)
        .take(limit as usize)
        .collect();

    (
        data,
        Pagination {
            current: page,
            pages,
            total,
            limit,
        },
    )
}

/// List the caller's workouts with optional type and date filters.
async fn list_workouts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ValidatedQuery(params): ValidatedQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<Workout>>>> {
    tracing::debug!(
        user_id = %user.user_id,
        workout_type = ?params.workout_type,
        start_date = ?params.start_date,
        end_date = ?params.end_date,
        page = params.page,
        "Listing workouts"
    );

    let filter = params.to_filter()?;
    let workouts = state.db.find_workouts(&user.user_id, &filter).await?;
    let (data, pagination) = paginate(workouts, params.page, params.limit);

    Ok(ApiResponse::paged(data, pagination))
}

// ─── Single Workout ──────────────────────────────────────────

/// Load a workout owned by `user_id`; other users' workouts read as missing.
async fn load_owned(state: &AppState, user_id: &str, workout_id: &str) -> Result<Workout> {
    state
        .db
        .get_workout(workout_id)
        .await?
        .filter(|w| w.user_id == user_id)
        .ok_or_else(|| AppError::NotFound("Workout not found".to_string()))
}

async fn get_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Workout>>> {
    let workout = load_owned(&state, &user.user_id, &id).await?;
    Ok(ApiResponse::ok(workout))
}

/// Create a workout and count it toward the caller's totals.
async fn create_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(input): ValidatedJson<WorkoutInput>,
) -> Result<(StatusCode, Json<ApiResponse<Workout>>)> {
    let now = Utc::now();
    let workout = input.into_workout(
        uuid::Uuid::new_v4().to_string(),
        user.user_id.clone(),
        now,
        now,
        now,
    )?;

    state
        .db
        .commit_workout_change(&WorkoutChange::Created(workout.clone()))
        .await?;

    tracing::info!(
        user_id = %user.user_id,
        workout_id = %workout.id,
        workout_type = %workout.workout_type,
        duration = workout.duration,
        "Workout created"
    );

    Ok((StatusCode::CREATED, ApiResponse::ok(workout)))
}

/// Replace a workout wholesale and shift the caller's totals by the difference.
async fn update_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<WorkoutInput>,
) -> Result<Json<ApiResponse<Workout>>> {
    let previous = load_owned(&state, &user.user_id, &id).await?;
    let current = input.into_workout(
        previous.id.clone(),
        previous.user_id.clone(),
        previous.date,
        previous.created_at,
        Utc::now(),
    )?;

    state
        .db
        .commit_workout_change(&WorkoutChange::Updated {
            previous,
            current: current.clone(),
        })
        .await?;

    tracing::info!(user_id = %user.user_id, workout_id = %current.id, "Workout updated");

    Ok(ApiResponse::ok(current))
}

/// Delete a workout and remove it from the caller's totals.
async fn delete_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let workout = load_owned(&state, &user.user_id, &id).await?;

    state
        .db
        .commit_workout_change(&WorkoutChange::Deleted(workout))
        .await?;

    tracing::info!(user_id = %user.user_id, workout_id = %id, "Workout deleted");

    Ok(MessageResponse::ok("Workout deleted"))
}

// ─── Summary ─────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct SummaryQuery {
    /// Trailing window in days
    #[serde(default = "default_period")]
    #[validate(range(min = 1, max = 365, message = "Period must be between 1 and 365 days"))]
    pub period: u32,
}

fn default_period() -> u32 {
    DEFAULT_PERIOD_DAYS
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub period_days: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(flatten)]
    pub stats: WorkoutSummary,
}

/// Totals, type distribution and weekly counts over the trailing window.
async fn get_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ValidatedQuery(params): ValidatedQuery<SummaryQuery>,
) -> Result<Json<ApiResponse<SummaryResponse>>> {
    let end = to_stored_precision(Utc::now());
    let start = end - chrono::Duration::days(i64::from(params.period));

    let workouts = state
        .db
        .find_workouts(&user.user_id, &WorkoutQuery::between(start, end))
        .await?;

    tracing::debug!(
        user_id = %user.user_id,
        period = params.period,
        count = workouts.len(),
        "Computing workout summary"
    );

    Ok(ApiResponse::ok(SummaryResponse {
        period_days: params.period,
        start_date: start,
        end_date: end,
        stats: summarize(&workouts),
    }))
}

// ─── Calendar ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    /// `YYYY-MM-DD` -> workouts that day
    pub days: BTreeMap<String, Vec<Workout>>,
}

fn parse_year_month(year: &str, month: &str) -> Result<(i32, u32)> {
    let mut errors = Vec::new();

    let year = match year.parse::<i32>() {
        Ok(y) if (1970..=9999).contains(&y) => Some(y),
        _ => {
            errors.push(FieldError::new("year", "Year must be between 1970 and 9999"));
            None
        }
    };
    let month = match month.parse::<u32>() {
        Ok(m) if (1..=12).contains(&m) => Some(m),
        _ => {
            errors.push(FieldError::new("month", "Month must be between 1 and 12"));
            None
        }
    };

    match (year, month) {
        (Some(y), Some(m)) => Ok((y, m)),
        _ => Err(AppError::Validation(errors)),
    }
}

/// A month's workouts grouped by calendar day.
async fn get_calendar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path((year, month)): Path<(String, String)>,
) -> Result<Json<ApiResponse<CalendarResponse>>> {
    let (year, month) = parse_year_month(&year, &month)?;
    let (start, end) = month_bounds(year, month)
        .ok_or_else(|| AppError::invalid("month", "Month must be between 1 and 12"))?;

    let workouts = state
        .db
        .find_workouts(&user.user_id, &WorkoutQuery::between(start, end))
        .await?;

    Ok(ApiResponse::ok(CalendarResponse {
        year,
        month,
        days: stats::group_by_day(workouts),
    }))
}
