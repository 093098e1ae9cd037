// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym-Tracker client core
//!
//! Session handling and resource loading for the gym-tracking front-end:
//! who is signed in, what gets fetched for them, and keeping each screen's
//! data in step with sign-in and sign-out.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod resources;
pub mod services;
pub mod session;
pub mod views;

use config::Config;
use db::{DataSource, MemoryBackend, RestDataSource};
use error::AppError;
use services::{AuthClient, RestAuthClient, StorageUrls};
use session::{FileSlot, SessionStore};
use std::sync::Arc;

/// Base URL used for storage links when running against the in-memory backend.
const OFFLINE_BASE_URL: &str = "http://localhost";

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub data: Arc<dyn DataSource>,
    pub session: Arc<SessionStore>,
}

impl AppState {
    /// Wire up the backend clients and the session store for `config`.
    ///
    /// Without a backend URL everything runs against an in-memory backend
    /// seeded with demo data.
    pub fn build(config: Config) -> Result<Self, AppError> {
        let slot = Arc::new(FileSlot::new(&config.session_dir));

        let (auth, data, urls) = match &config.backend_url {
            Some(base_url) => {
                let http = reqwest::Client::builder()
                    .timeout(config.fetch_timeout)
                    .build()
                    .map_err(|e| {
                        AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e))
                    })?;
                let auth: Arc<dyn AuthClient> = Arc::new(RestAuthClient::new(
                    http.clone(),
                    base_url,
                    &config.backend_anon_key,
                ));
                let data: Arc<dyn DataSource> =
                    Arc::new(RestDataSource::new(http, base_url, &config.backend_anon_key));
                (auth, data, StorageUrls::new(base_url.as_str()))
            }
            None => {
                tracing::info!("No backend configured, using in-memory demo backend");
                let backend = Arc::new(MemoryBackend::with_demo_data());
                let auth: Arc<dyn AuthClient> = backend.clone();
                let data: Arc<dyn DataSource> = backend;
                (auth, data, StorageUrls::new(OFFLINE_BASE_URL))
            }
        };

        let session = Arc::new(SessionStore::new(auth, data.clone(), slot, urls));
        Ok(Self {
            config,
            data,
            session,
        })
    }
}
