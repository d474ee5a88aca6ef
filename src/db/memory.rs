// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! All state sits behind one lock. Every user write, workout write and stat
//! delta happens under a single write guard.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::db::{identity_taken, user_not_found, Store, UserEdit};
use crate::error::AppError;
use crate::models::{
    workout::sort_newest_first, User, UserStats, Workout, WorkoutChange, WorkoutQuery,
};

#[derive(Default)]
struct Collections {
    users: HashMap<String, User>,
    workouts: HashMap<String, Workout>,
}

/// In-memory store.
#[derive(Default)]
pub struct MemoryDb {
    inner: RwLock<Collections>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryDb {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.inner.read().await.users.get(user_id).cloned())
    }

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner
            .users
            .values()
            .find(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::Validation(vec![identity_taken(
                existing,
                &user.username,
            )]));
        }

        inner.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn modify_user(&self, user_id: &str, edit: UserEdit) -> Result<User, AppError> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(user_id)
            .ok_or_else(|| user_not_found(user_id))?;

        // Edit a copy so a failed edit leaves the stored user untouched
        let mut edited = user.clone();
        edit(&mut edited)?;
        *user = edited.clone();
        Ok(edited)
    }

    async fn recompute_user_stats(&self, user_id: &str) -> Result<(UserStats, User), AppError> {
        let mut inner = self.inner.write().await;
        let Collections { users, workouts } = &mut *inner;

        let user = users.get_mut(user_id).ok_or_else(|| user_not_found(user_id))?;
        let before = user.stats.clone();
        user.stats
            .recompute_totals(workouts.values().filter(|w| w.user_id == user_id));
        user.updated_at = chrono::Utc::now();

        Ok((before, user.clone()))
    }

    async fn delete_user_data(&self, user_id: &str) -> Result<usize, AppError> {
        let mut inner = self.inner.write().await;
        let before = inner.workouts.len();
        inner.workouts.retain(|_, w| w.user_id != user_id);
        let mut deleted = before - inner.workouts.len();
        if inner.users.remove(user_id).is_some() {
            deleted += 1;
        }
        tracing::info!(user_id, deleted, "User data deletion complete");
        Ok(deleted)
    }

    async fn get_workout(&self, workout_id: &str) -> Result<Option<Workout>, AppError> {
        Ok(self.inner.read().await.workouts.get(workout_id).cloned())
    }

    async fn find_workouts(
        &self,
        user_id: &str,
        query: &WorkoutQuery,
    ) -> Result<Vec<Workout>, AppError> {
        let mut workouts: Vec<Workout> = self
            .inner
            .read()
            .await
            .workouts
            .values()
            .filter(|w| w.user_id == user_id && query.matches(w))
            .cloned()
            .collect();
        sort_newest_first(&mut workouts);
        Ok(workouts)
    }

    async fn commit_workout_change(&self, change: &WorkoutChange) -> Result<User, AppError> {
        let mut inner = self.inner.write().await;

        let mut owner = inner
            .users
            .get(change.user_id())
            .cloned()
            .ok_or_else(|| user_not_found(change.user_id()))?;

        owner.stats.apply(change.delta());
        owner.updated_at = chrono::Utc::now();

        match change {
            WorkoutChange::Created(w) | WorkoutChange::Updated { current: w, .. } => {
                inner.workouts.insert(w.id.clone(), w.clone());
            }
            WorkoutChange::Deleted(w) => {
                inner.workouts.remove(&w.id);
            }
        }
        inner.users.insert(owner.id.clone(), owner.clone());

        Ok(owner)
    }
}
