// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Custom field checks used by `#[validate(custom(...))]`.

use std::borrow::Cow;

use chrono::{NaiveDate, Utc};
use validator::ValidationError;

use crate::models::WorkoutType;
use crate::time_utils::{parse_date_param, DayBound};

const MAX_GOAL_LEN: usize = 100;

fn error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("blank", "Must not be blank"));
    }
    Ok(())
}

pub fn workout_type(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<WorkoutType>()
        .map(|_| ())
        .map_err(|msg| error("workout_type", msg))
}

/// RFC3339 timestamp or `YYYY-MM-DD`.
pub fn date_param(value: &str) -> Result<(), ValidationError> {
    parse_date_param(value, DayBound::Start)
        .map(|_| ())
        .ok_or_else(|| error("date", "Must be a valid date (YYYY-MM-DD or RFC3339)"))
}

pub fn username(value: &str) -> Result<(), ValidationError> {
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(error(
            "username",
            "Username can only contain letters, numbers, and underscores",
        ));
    }
    Ok(())
}

pub fn birth_date(value: &NaiveDate) -> Result<(), ValidationError> {
    if *value > Utc::now().date_naive() {
        return Err(error("date_of_birth", "Date of birth cannot be in the future"));
    }
    Ok(())
}

pub fn goals(values: &[String]) -> Result<(), ValidationError> {
    for goal in values {
        let len = goal.trim().chars().count();
        if len == 0 || len > MAX_GOAL_LEN {
            return Err(error("goals", "Each goal must be 1-100 characters"));
        }
    }
    Ok(())
}
