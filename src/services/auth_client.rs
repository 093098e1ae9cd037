// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend auth client: credential checks, session issuance and the
//! session-change event stream.
//!
//! The session store only ever learns about sign-in and sign-out through
//! [`AuthClient::subscribe`]. Every listener sees the same events in the
//! same order, so independent listeners converge on one state.

use crate::error::AppError;
use crate::models::{Credentials, IdentityRef};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::{broadcast, RwLock};

/// Capacity of the auth event channel. Slow listeners that fall further
/// behind than this see a `Lagged` error and skip ahead.
pub const AUTH_EVENT_CAPACITY: usize = 16;

/// Session-change notification emitted by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SessionEstablished(IdentityRef),
    SessionEnded,
}

/// Contract the session store needs from the auth provider.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Check email and password; on success a `SessionEstablished` event follows.
    async fn verify_credentials(&self, credentials: &Credentials) -> Result<IdentityRef, AppError>;

    /// Create an account. A `SessionEstablished` event follows only if the
    /// provider opens a session right away (no email confirmation step).
    async fn register(&self, credentials: &Credentials) -> Result<IdentityRef, AppError>;

    /// End the current session; on success a `SessionEnded` event follows.
    async fn end_session(&self) -> Result<(), AppError>;

    /// Send a password reset email.
    async fn request_password_reset(&self, email: &str) -> Result<(), AppError>;

    /// Subscribe to session-change events.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

// ─────────────────────────────────────────────────────────────────────────────
// RestAuthClient - hosted auth endpoints over HTTP
// ─────────────────────────────────────────────────────────────────────────────

/// Auth client for the hosted platform's `/auth/v1` endpoints.
pub struct RestAuthClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    /// Access token of the live session, needed for logout.
    access_token: RwLock<Option<String>>,
    events: broadcast::Sender<AuthEvent>,
}

impl RestAuthClient {
    /// Create a client for `base_url` authenticated with the public anon key.
    pub fn new(http: reqwest::Client, base_url: &str, anon_key: &str) -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            http,
            base_url: format!("{}/auth/v1", base_url.trim_end_matches('/')),
            anon_key: anon_key.to_string(),
            access_token: RwLock::new(None),
            events,
        }
    }

    fn emit(&self, event: AuthEvent) {
        // No receivers is fine, nobody is listening yet.
        if self.events.send(event).is_err() {
            tracing::debug!("Auth event dropped, no subscribers");
        }
    }

    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, AppError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header("apikey", &self.anon_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Backend(format!("Auth request failed: {}", e)))?;

        let response = check_auth_response(response).await?;
        response
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("JSON parse error: {}", e)))
    }
}

#[async_trait]
impl AuthClient for RestAuthClient {
    async fn verify_credentials(&self, credentials: &Credentials) -> Result<IdentityRef, AppError> {
        let body = serde_json::json!({
            "email": credentials.email,
            "password": credentials.password,
        });
        let session: SessionResponse = self
            .post_json("/token?grant_type=password", &body)
            .await?;

        *self.access_token.write().await = Some(session.access_token);
        let identity = session.user.into_ref();
        tracing::info!(user_id = %identity.user_id, "Credentials verified");
        self.emit(AuthEvent::SessionEstablished(identity.clone()));
        Ok(identity)
    }

    async fn register(&self, credentials: &Credentials) -> Result<IdentityRef, AppError> {
        let body = serde_json::json!({
            "email": credentials.email,
            "password": credentials.password,
        });
        let response: SignUpResponse = self.post_json("/signup", &body).await?;

        match response {
            SignUpResponse::Session(session) => {
                *self.access_token.write().await = Some(session.access_token);
                let identity = session.user.into_ref();
                tracing::info!(user_id = %identity.user_id, "Account created with live session");
                self.emit(AuthEvent::SessionEstablished(identity.clone()));
                Ok(identity)
            }
            SignUpResponse::User(user) => {
                let identity = user.into_ref();
                tracing::info!(
                    user_id = %identity.user_id,
                    "Account created, email confirmation pending"
                );
                Ok(identity)
            }
        }
    }

    async fn end_session(&self) -> Result<(), AppError> {
        let token = self.access_token.write().await.take();

        if let Some(token) = token {
            let response = self
                .http
                .post(format!("{}/logout", self.base_url))
                .header("apikey", &self.anon_key)
                .bearer_auth(token)
                .send()
                .await
                .map_err(|e| AppError::Backend(format!("Logout request failed: {}", e)))?;

            // 401 means the session was already gone server-side.
            if response.status().as_u16() != 401 {
                check_auth_response(response).await?;
            }
        }

        self.emit(AuthEvent::SessionEnded);
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let body = serde_json::json!({ "email": email });
        let _: serde_json::Value = self.post_json("/recover", &body).await?;
        tracing::info!("Password reset email requested");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

/// Check response status and map auth failures.
async fn check_auth_response(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();

    if status.as_u16() == 429 {
        tracing::warn!("Auth rate limit hit (429)");
        return Err(AppError::Backend(AppError::RATE_LIMITED.to_string()));
    }

    if matches!(status.as_u16(), 400 | 401 | 422) {
        let parsed: AuthErrorBody = serde_json::from_str(&body).unwrap_or_default();
        return Err(AppError::InvalidCredentials(parsed.message()));
    }

    Err(AppError::Backend(format!("HTTP {}: {}", status, body)))
}

/// Token response from the password grant (and auto-confirmed signups).
#[derive(Debug, Deserialize)]
struct SessionResponse {
    access_token: String,
    user: AuthUserResponse,
}

#[derive(Debug, Deserialize)]
struct AuthUserResponse {
    id: String,
    email: Option<String>,
}

impl AuthUserResponse {
    fn into_ref(self) -> IdentityRef {
        IdentityRef {
            user_id: self.id,
            email: self.email,
        }
    }
}

/// Signup returns a session when confirmation is off, a bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(SessionResponse),
    User(AuthUserResponse),
}

/// Error body; the provider has used several field names over time.
#[derive(Debug, Default, Deserialize)]
struct AuthErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl AuthErrorBody {
    fn message(self) -> String {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .unwrap_or_else(|| "Invalid login credentials".to_string())
    }
}
