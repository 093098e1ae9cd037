// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types shared by the session and resource layers.

/// Application error type.
///
/// Direct user actions (sign-in, sign-up, password reset) turn these into
/// user-visible messages via [`AppError::user_message`]; background loads
/// only record them.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message returned by the backend when it throttles us.
    pub const RATE_LIMITED: &'static str = "Too many requests, try again later";

    /// Short message suitable for showing in a form.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidCredentials(msg) | AppError::BadRequest(msg) => msg.clone(),
            AppError::Unauthorized => "You need to sign in first".to_string(),
            AppError::NotFound(_) => "User not found".to_string(),
            AppError::Backend(msg) if msg == Self::RATE_LIMITED => msg.clone(),
            AppError::Backend(_) | AppError::Storage(_) | AppError::Internal(_) => {
                "Something went wrong, please try again".to_string()
            }
        }
    }

    /// True for failures caused by the network or the hosted backend.
    pub fn is_backend(&self) -> bool {
        matches!(self, AppError::Backend(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Storage(format!("JSON error: {}", e))
    }
}

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, AppError>;
