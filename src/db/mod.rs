//! Database layer (document store).
//!
//! [`Store`] is implemented by [`FirestoreDb`] for production and by
//! [`MemoryDb`] for local runs and tests.
//!
//! Every write that touches a user document goes through an atomic
//! operation here. Handlers never read a user and write it back themselves,
//! since the embedded stats may have moved in between.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use self::memory::MemoryDb;

use std::sync::Arc;

use crate::error::{AppError, FieldError};
use crate::models::{User, UserStats, Workout, WorkoutChange, WorkoutQuery};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const WORKOUTS: &str = "workouts";
    /// One document per claimed username or email, keyed by [`super::claim_id`].
    pub const USER_IDENTITIES: &str = "user_identities";
}

/// Edit applied to a stored user inside the store's atomic section.
///
/// May run more than once when a transaction is retried, so it must only
/// touch the `User` it is given.
pub type UserEdit = Arc<dyn Fn(&mut User) -> Result<(), AppError> + Send + Sync>;

/// Document ID reserving a username or email.
pub fn claim_id(kind: &str, value: &str) -> String {
    // Firestore document IDs cannot contain '/'
    format!("{}:{}", kind, value.replace('/', "%2F"))
}

/// Field error for an identity that is already held by another user.
pub fn identity_taken(existing: &User, username: &str) -> FieldError {
    if existing.username == username {
        FieldError::new("username", "Username is already taken")
    } else {
        FieldError::new("email", "Email is already registered")
    }
}

/// Document store operations used by the route layer.
#[async_trait]
pub trait Store: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    /// Insert a new user, claiming its username and email.
    ///
    /// Fails with a validation error on `username` or `email` when either is
    /// already held.
    async fn create_user(&self, user: &User) -> Result<(), AppError>;

    /// Apply `edit` to the stored user and write it back atomically.
    ///
    /// Returns the user as stored after the edit.
    async fn modify_user(&self, user_id: &str, edit: UserEdit) -> Result<User, AppError>;

    /// Replace the owner's totals with sums over their stored workouts.
    ///
    /// Returns the totals before the rebuild and the updated user.
    async fn recompute_user_stats(&self, user_id: &str) -> Result<(UserStats, User), AppError>;

    /// Delete a user, their identity claims and every workout they own.
    ///
    /// Returns the number of user and workout documents deleted.
    async fn delete_user_data(&self, user_id: &str) -> Result<usize, AppError>;

    // ─── Workouts ────────────────────────────────────────────────

    async fn get_workout(&self, workout_id: &str) -> Result<Option<Workout>, AppError>;

    /// All of a user's workouts matching `query`, newest first.
    async fn find_workouts(
        &self,
        user_id: &str,
        query: &WorkoutQuery,
    ) -> Result<Vec<Workout>, AppError>;

    /// Write a workout change and apply its stat delta to the owner atomically.
    ///
    /// Returns the owner as stored after the change.
    async fn commit_workout_change(&self, change: &WorkoutChange) -> Result<User, AppError>;
}

pub(crate) fn user_not_found(user_id: &str) -> AppError {
    AppError::NotFound(format!("User {} not found", user_id))
}
