// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

/// Which document store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Firestore,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StorageBackend::Firestore),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::Invalid {
                name: "STORAGE_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore backend only)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    pub storage_backend: StorageBackend,
}

impl Config {
    /// Config for tests: in-memory storage, no env lookups.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            storage_backend: StorageBackend::Memory,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let storage_backend: StorageBackend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .parse()?;

        let gcp_project_id = match storage_backend {
            StorageBackend::Firestore => {
                env::var("GCP_PROJECT_ID").map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?
            }
            StorageBackend::Memory => {
                env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string())
            }
        };

        let port: u16 = match env::var("PORT") {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            Err(_) => 8080,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id,
            port,
            storage_backend,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}
