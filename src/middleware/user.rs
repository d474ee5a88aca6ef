// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Caller identity middleware.
//!
//! The front proxy forwards the signed-in user's ID in `X-User-Id`. This
//! layer only resolves it to a stored user; it does not authenticate.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

pub const USER_ID_HEADER: &str = "x-user-id";

/// User resolved from the request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
}

/// Middleware that requires an `X-User-Id` naming an existing user.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(AppError::Unauthorized)?
        .to_string();

    if state.db.get_user(&user_id).await?.is_none() {
        tracing::debug!(user_id = %user_id, "Request for unknown user");
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }

    request.extensions_mut().insert(CurrentUser { user_id });

    Ok(next.run(request).await)
}
