// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! REST client for the hosted backend's table endpoint.
//!
//! Each fetcher is a single `GET /rest/v1/<table>` with equality filters
//! and an order clause; inserts ask for the stored row back.

use crate::db::{tables, DataSource};
use crate::error::AppError;
use crate::models::{Exercise, NewUser, Routine, User, WorkoutSession};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Clone)]
struct RestClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

/// Table client for the hosted backend.
#[derive(Clone)]
pub struct RestDataSource {
    client: Option<RestClient>,
}

impl RestDataSource {
    /// Create a client for `base_url` authenticated with the public anon key.
    pub fn new(http: reqwest::Client, base_url: &str, anon_key: &str) -> Self {
        Self {
            client: Some(RestClient {
                http,
                base_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
                anon_key: anon_key.to_string(),
            }),
        }
    }

    /// Create an offline client for testing.
    ///
    /// All operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&RestClient, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Backend("Backend not connected (offline mode)".to_string()))
    }

    /// `GET /<table>?select=*&<filters>`.
    async fn select<T: for<'de> Deserialize<'de>>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, AppError> {
        let client = self.get_client()?;

        let mut query: Vec<(&str, String)> = vec![("select", "*".to_string())];
        query.extend(filters.iter().cloned());

        let response = client
            .http
            .get(format!("{}/{}", client.base_url, table))
            .header("apikey", &client.anon_key)
            .bearer_auth(&client.anon_key)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        check_response_json(response).await
    }
}

#[async_trait]
impl DataSource for RestDataSource {
    async fn all_exercises(&self) -> Result<Vec<Exercise>, AppError> {
        self.select(tables::EXERCISES, &[]).await
    }

    async fn public_routines(&self) -> Result<Vec<Routine>, AppError> {
        self.select(
            tables::ROUTINES,
            &[
                ("is_public", "eq.true".to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn user_routines(&self, user_id: &str) -> Result<Vec<Routine>, AppError> {
        self.select(
            tables::ROUTINES,
            &[
                ("user_id", format!("eq.{}", user_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn user_sessions(&self, user_id: &str) -> Result<Vec<WorkoutSession>, AppError> {
        self.select(
            tables::SESSIONS,
            &[
                ("user_id", format!("eq.{}", user_id)),
                ("order", "date.desc".to_string()),
            ],
        )
        .await
    }

    async fn user_by_id(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .select(tables::USERS, &[("id", format!("eq.{}", user_id))])
            .await?;
        Ok(users.into_iter().next())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, AppError> {
        let client = self.get_client()?;

        let response = client
            .http
            .post(format!("{}/{}", client.base_url, tables::USERS))
            .header("apikey", &client.anon_key)
            .bearer_auth(&client.anon_key)
            .header("Prefer", "return=representation")
            .json(user)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        let rows: Vec<User> = check_response_json(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::Backend("Insert returned no row".to_string()))
    }
}

/// Check response and parse JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            tracing::warn!("Backend rate limit hit (429)");
            return Err(AppError::Backend(AppError::RATE_LIMITED.to_string()));
        }

        if status.as_u16() == 401 {
            return Err(AppError::Unauthorized);
        }

        return Err(AppError::Backend(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Backend(format!("JSON parse error: {}", e)))
}
