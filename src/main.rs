// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! DanielSport API Server
//!
//! Workout logging with per-user lifetime totals and training summaries.

use danielsport::{
    config::{Config, StorageBackend},
    db::{FirestoreDb, MemoryDb, Store},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        storage = ?config.storage_backend,
        "Starting DanielSport API"
    );

    let db: Arc<dyn Store> = match config.storage_backend {
        StorageBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Arc::new(MemoryDb::new())
        }
    };

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
    });

    // Build router
    let app = danielsport::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("danielsport=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
