// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User, identity and credential models.

use crate::services::StorageUrls;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User profile row in the `users` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    /// Same id as the auth provider's user
    pub id: String,
    /// Display name
    pub name: String,
    /// Avatar file name in the `avatars` bucket
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload for a freshly registered user.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
}

/// The signed-in user as held by the client.
///
/// This is also the persisted session record. Only `id` and `name` are
/// required when reading it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Identity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Public URL of the avatar, derived from `avatar`
    #[serde(rename = "avatarUrl", default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Identity {
    /// Build an identity from a user row, deriving the avatar URL.
    pub fn from_user(user: User, urls: &StorageUrls) -> Self {
        let avatar_url = user.avatar.as_deref().map(|f| urls.avatar_url(f));
        Self {
            id: user.id,
            name: user.name,
            avatar: user.avatar,
            created_at: user.created_at,
            avatar_url,
        }
    }

    /// Parse a persisted record. Returns `None` for anything malformed.
    pub fn from_record(raw: &str) -> Option<Self> {
        let identity: Identity = serde_json::from_str(raw).ok()?;
        if identity.id.trim().is_empty() {
            return None;
        }
        Some(identity)
    }
}

/// Reference to a user handed back by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRef {
    pub user_id: String,
    pub email: Option<String>,
}

impl IdentityRef {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
        }
    }
}

/// Email and password as typed by the user.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}
