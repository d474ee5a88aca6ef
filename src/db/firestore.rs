// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile, lifetime stats, team memberships)
//! - Workouts (one document per session, owner in `userId`)
//!
//! Timestamps are stored as second-precision RFC3339 strings, so range
//! filters on `date` compare lexicographically.
//!
//! Writes that read a user first run inside `run_transaction`. Reads made
//! through the transaction's client register for conflict detection, and
//! Firestore retries the closure when another writer got there first.

use async_trait::async_trait;
use firestore::errors::{BackoffError, FirestoreError};
use firestore::{FirestoreResult, FirestoreWritePrecondition};
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};

use crate::db::{claim_id, collections, user_not_found, Store, UserEdit};
use crate::error::{AppError, FieldError};
use crate::models::{
    workout::sort_newest_first, User, UserStats, Workout, WorkoutChange, WorkoutQuery,
};
use crate::time_utils::format_utc_rfc3339;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. Every operation returns a database error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Batch delete documents using transactions.
    async fn batch_delete(&self, collection: &str, doc_ids: &[String]) -> Result<(), AppError> {
        let client = self.get_client()?;

        for chunk in doc_ids.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for doc_id in chunk {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

/// Reservation of a username or email, stored under `user_identities`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityClaim {
    user_id: String,
}

fn transaction_error(context: &str, e: FirestoreError) -> AppError {
    AppError::Database(format!("{}: {}", context, e))
}

/// Run the workout query against `client`, which may be bound to a transaction.
async fn query_workouts(
    client: &firestore::FirestoreDb,
    user_id: &str,
    query: &WorkoutQuery,
) -> FirestoreResult<Vec<Workout>> {
    let user_id = user_id.to_string();
    let workout_type = query.workout_type.map(|t| t.as_str().to_string());
    let start = query.start.map(format_utc_rfc3339);
    let end = query.end.map(format_utc_rfc3339);

    let mut workouts: Vec<Workout> = client
        .fluent()
        .select()
        .from(collections::WORKOUTS)
        .filter(move |q| {
            q.for_all([
                q.field("userId").eq(user_id.clone()),
                workout_type.clone().and_then(|t| q.field("type").eq(t)),
                start
                    .clone()
                    .and_then(|s| q.field("date").greater_than_or_equal(s)),
                end.clone().and_then(|e| q.field("date").less_than_or_equal(e)),
            ])
        })
        .order_by([("date", firestore::FirestoreQueryDirection::Descending)])
        .obj()
        .query()
        .await?;

    sort_newest_first(&mut workouts);
    Ok(workouts)
}

#[async_trait]
impl Store for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Claim the username and email, then insert the user, in one transaction.
    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let client = self.get_client()?;
        let user = user.clone();
        let user_id = user.id.clone();

        let taken: Option<FieldError> = client
            .run_transaction(move |db, transaction| {
                let user = user.clone();
                async move {
                    let claims = [
                        (
                            claim_id("username", &user.username),
                            FieldError::new("username", "Username is already taken"),
                        ),
                        (
                            claim_id("email", &user.email),
                            FieldError::new("email", "Email is already registered"),
                        ),
                    ];

                    for (key, taken) in &claims {
                        let existing: Option<IdentityClaim> = db
                            .fluent()
                            .select()
                            .by_id_in(collections::USER_IDENTITIES)
                            .obj()
                            .one(key.as_str())
                            .await?;
                        if existing.is_some() {
                            return Ok(Some(taken.clone()));
                        }
                    }

                    let claim = IdentityClaim {
                        user_id: user.id.clone(),
                    };
                    for (key, _) in &claims {
                        db.fluent()
                            .update()
                            .in_col(collections::USER_IDENTITIES)
                            .precondition(FirestoreWritePrecondition::Exists(false))
                            .document_id(key.as_str())
                            .object(&claim)
                            .add_to_transaction(transaction)?;
                    }

                    db.fluent()
                        .update()
                        .in_col(collections::USERS)
                        .precondition(FirestoreWritePrecondition::Exists(false))
                        .document_id(&user.id)
                        .object(&user)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(None)
                }
                .boxed()
            })
            .await
            .map_err(|e| transaction_error("User creation failed", e))?;

        if let Some(field) = taken {
            return Err(AppError::Validation(vec![field]));
        }

        tracing::debug!(user_id = %user_id, "User and identity claims created");
        Ok(())
    }

    async fn modify_user(&self, user_id: &str, edit: UserEdit) -> Result<User, AppError> {
        let client = self.get_client()?;
        let id = user_id.to_string();

        let outcome: Option<Result<User, AppError>> = client
            .run_transaction(move |db, transaction| {
                let id = id.clone();
                let edit = edit.clone();
                async move {
                    let stored: Option<User> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&id)
                        .await?;
                    let Some(mut user) = stored else {
                        return Ok(None);
                    };

                    // A rejected edit commits nothing
                    if let Err(e) = edit(&mut user) {
                        return Ok(Some(Err(e)));
                    }

                    db.fluent()
                        .update()
                        .in_col(collections::USERS)
                        .document_id(&user.id)
                        .object(&user)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(Some(Ok(user)))
                }
                .boxed()
            })
            .await
            .map_err(|e| transaction_error("User update failed", e))?;

        outcome.ok_or_else(|| user_not_found(user_id))?
    }

    async fn recompute_user_stats(&self, user_id: &str) -> Result<(UserStats, User), AppError> {
        let client = self.get_client()?;
        let id = user_id.to_string();

        let outcome: Option<(UserStats, User)> = client
            .run_transaction(move |db, transaction| {
                let id = id.clone();
                async move {
                    let stored: Option<User> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&id)
                        .await?;
                    let Some(mut user) = stored else {
                        return Ok(None);
                    };

                    let workouts = query_workouts(&db, &id, &WorkoutQuery::default()).await?;
                    let before = user.stats.clone();
                    user.stats.recompute_totals(&workouts);
                    user.updated_at = chrono::Utc::now();

                    db.fluent()
                        .update()
                        .in_col(collections::USERS)
                        .document_id(&user.id)
                        .object(&user)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(Some((before, user)))
                }
                .boxed()
            })
            .await
            .map_err(|e| transaction_error("Stats recompute failed", e))?;

        outcome.ok_or_else(|| user_not_found(user_id))
    }

    async fn delete_user_data(&self, user_id: &str) -> Result<usize, AppError> {
        let workouts = self.find_workouts(user_id, &WorkoutQuery::default()).await?;
        let ids: Vec<String> = workouts.into_iter().map(|w| w.id).collect();
        let mut deleted_count = ids.len();

        self.batch_delete(collections::WORKOUTS, &ids).await?;
        tracing::debug!(user_id, count = deleted_count, "Deleted workouts");

        if let Some(user) = self.get_user(user_id).await? {
            let claims = vec![
                claim_id("username", &user.username),
                claim_id("email", &user.email),
            ];
            self.batch_delete(collections::USER_IDENTITIES, &claims)
                .await?;
            self.batch_delete(collections::USERS, &[user.id]).await?;
            deleted_count += 1;
            tracing::debug!(user_id, "Deleted user profile and identity claims");
        }

        tracing::info!(user_id, deleted_count, "User data deletion complete");

        Ok(deleted_count)
    }

    // ─── Workout Operations ──────────────────────────────────────

    async fn get_workout(&self, workout_id: &str) -> Result<Option<Workout>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::WORKOUTS)
            .obj()
            .one(workout_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_workouts(
        &self,
        user_id: &str,
        query: &WorkoutQuery,
    ) -> Result<Vec<Workout>, AppError> {
        query_workouts(self.get_client()?, user_id, query)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Write the workout and the owner's updated stats in one transaction.
    ///
    /// The owner is read through the transaction, so a concurrent change to
    /// the same user forces a retry instead of overwriting its delta.
    async fn commit_workout_change(&self, change: &WorkoutChange) -> Result<User, AppError> {
        let client = self.get_client()?;
        let owned_change = change.clone();

        let owner: Option<User> = client
            .run_transaction(move |db, transaction| {
                let change = owned_change.clone();
                async move {
                    let stored: Option<User> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(change.user_id())
                        .await?;
                    let Some(mut owner) = stored else {
                        return Ok(None);
                    };

                    owner.stats.apply(change.delta());
                    owner.updated_at = chrono::Utc::now();

                    match &change {
                        WorkoutChange::Created(workout)
                        | WorkoutChange::Updated {
                            current: workout, ..
                        } => {
                            db.fluent()
                                .update()
                                .in_col(collections::WORKOUTS)
                                .document_id(&workout.id)
                                .object(workout)
                                .add_to_transaction(transaction)?;
                        }
                        WorkoutChange::Deleted(workout) => {
                            db.fluent()
                                .delete()
                                .from(collections::WORKOUTS)
                                .document_id(&workout.id)
                                .add_to_transaction(transaction)?;
                        }
                    }

                    db.fluent()
                        .update()
                        .in_col(collections::USERS)
                        .document_id(&owner.id)
                        .object(&owner)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(Some(owner))
                }
                .boxed()
            })
            .await
            .map_err(|e| transaction_error("Workout transaction failed", e))?;

        let owner = owner.ok_or_else(|| user_not_found(change.user_id()))?;

        tracing::info!(
            user_id = change.user_id(),
            workout_id = change.workout_id(),
            "Workout change committed atomically"
        );

        Ok(owner)
    }
}
