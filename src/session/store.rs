// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session store: the signed-in identity and the session flag.
//!
//! State machine with two states, unauthenticated and authenticated:
//! - established event (or legacy `login`) with a resolvable user moves to
//!   authenticated and persists the identity
//! - ended event (or legacy `logout`) moves to unauthenticated and clears
//!   the persisted record
//! - `refresh` re-resolves the identity without touching the flag
//!
//! Identity is published before the flag goes up and cleared before the
//! flag goes down, so a flag subscriber always finds a matching identity.
//! Every established transition notifies the flag, even when it was
//! already up, so subscribers reload for a switched user.

use crate::db::DataSource;
use crate::error::{AppError, Result};
use crate::models::{Credentials, Identity, NewUser};
use crate::services::{AuthClient, AuthEvent, StorageUrls};
use crate::session::slot::SessionSlot;
use crate::session::AuthOutcome;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Owns the current identity and the session flag.
pub struct SessionStore {
    auth: Arc<dyn AuthClient>,
    data: Arc<dyn DataSource>,
    slot: Arc<dyn SessionSlot>,
    urls: StorageUrls,
    identity: watch::Sender<Option<Identity>>,
    authenticated: watch::Sender<bool>,
    /// Serializes transitions so events apply in arrival order.
    transitions: Mutex<()>,
}

impl SessionStore {
    /// Create an unauthenticated store. Call [`SessionStore::restore`] next.
    pub fn new(
        auth: Arc<dyn AuthClient>,
        data: Arc<dyn DataSource>,
        slot: Arc<dyn SessionSlot>,
        urls: StorageUrls,
    ) -> Self {
        let (identity, _) = watch::channel(None);
        let (authenticated, _) = watch::channel(false);
        Self {
            auth,
            data,
            slot,
            urls,
            identity,
            authenticated,
            transitions: Mutex::new(()),
        }
    }

    // ─── Startup ─────────────────────────────────────────────────

    /// Load the persisted record, if any, without re-verifying it.
    ///
    /// A malformed or unreadable record is discarded and the slot cleared.
    /// Returns the resulting session flag.
    pub async fn restore(&self) -> bool {
        let _guard = self.transitions.lock().await;

        let raw = match self.slot.load() {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!("No persisted session");
                return self.is_authenticated();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Persisted session unreadable, discarding");
                self.clear_locked();
                return false;
            }
        };

        match Identity::from_record(&raw) {
            Some(identity) => {
                tracing::info!(user_id = %identity.id, "Session restored from storage");
                self.publish(identity);
                true
            }
            None => {
                tracing::warn!("Persisted session malformed, discarding");
                self.clear_locked();
                false
            }
        }
    }

    /// Feed the auth client's event stream into [`SessionStore::on_auth_event`].
    ///
    /// The pump ends when the stream closes; abort the handle to stop it
    /// earlier.
    pub fn spawn_event_pump(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.auth.subscribe();
        let store = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        // Failures are logged inside and must not stop the pump.
                        let _ = store.on_auth_event(event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Auth event listener lagged");
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("Auth event stream closed");
                        break;
                    }
                }
            }
        })
    }

    // ─── Transitions ─────────────────────────────────────────────

    /// Apply a session-change event from the auth provider.
    ///
    /// If the established identity cannot be resolved to a user the event is
    /// dropped: state stays as it was and the error is returned.
    pub async fn on_auth_event(&self, event: AuthEvent) -> Result<()> {
        let _guard = self.transitions.lock().await;

        match event {
            AuthEvent::SessionEstablished(identity_ref) => {
                let identity = self.resolve(&identity_ref.user_id).await.inspect_err(|e| {
                    tracing::error!(
                        user_id = %identity_ref.user_id,
                        error = %e,
                        "Could not resolve signed-in user, ignoring session event"
                    );
                })?;
                self.persist(&identity);
                tracing::info!(user_id = %identity.id, "Session established");
                self.publish(identity);
            }
            AuthEvent::SessionEnded => {
                self.clear_locked();
                tracing::info!("Session ended");
            }
        }
        Ok(())
    }

    /// Re-read the current user's profile. The session flag does not change.
    pub async fn refresh(&self) -> Result<()> {
        let _guard = self.transitions.lock().await;

        let Some(user_id) = self.current_user_id() else {
            return Ok(());
        };

        let identity = self.resolve(&user_id).await.inspect_err(|e| {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to refresh user");
        })?;
        self.persist(&identity);
        self.identity.send_replace(Some(identity));
        Ok(())
    }

    /// Sign in by user id without the auth client.
    ///
    /// Bootstrap and test path for environments without credential auth.
    pub async fn login(&self, user_id: &str) -> Result<Identity> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::BadRequest("User id is required".to_string()));
        }

        let _guard = self.transitions.lock().await;
        let identity = self.resolve(user_id).await.inspect_err(|e| {
            tracing::error!(user_id, error = %e, "Direct login failed");
        })?;
        self.persist(&identity);
        tracing::info!(user_id, "Logged in directly");
        self.publish(identity.clone());
        Ok(identity)
    }

    /// Sign out locally without the auth client.
    pub async fn logout(&self) {
        let _guard = self.transitions.lock().await;
        self.clear_locked();
        tracing::info!("Logged out directly");
    }

    // ─── Credential actions ──────────────────────────────────────

    /// Check credentials with the auth provider.
    ///
    /// On success the state change arrives through the event stream.
    pub async fn sign_in(&self, credentials: &Credentials) -> AuthOutcome {
        match self.auth.verify_credentials(credentials).await {
            Ok(identity_ref) => {
                tracing::info!(user_id = %identity_ref.user_id, "Sign-in accepted");
                AuthOutcome::ok("Signed in")
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sign-in rejected");
                AuthOutcome::failed(&e)
            }
        }
    }

    /// Create an account and its user profile.
    pub async fn sign_up(&self, credentials: &Credentials, name: &str) -> AuthOutcome {
        let identity_ref = match self.auth.register(credentials).await {
            Ok(identity_ref) => identity_ref,
            Err(e) => {
                tracing::warn!(error = %e, "Sign-up rejected");
                return AuthOutcome::failed(&e);
            }
        };

        let profile = NewUser {
            id: identity_ref.user_id.clone(),
            name: name.trim().to_string(),
            avatar: None,
        };
        match self.data.create_user(&profile).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Account and profile created");
                AuthOutcome::ok("Account created. Check your email to confirm it.")
            }
            Err(e) => {
                tracing::error!(
                    user_id = %identity_ref.user_id,
                    error = %e,
                    "Account created but profile insert failed"
                );
                AuthOutcome::failed(&e)
            }
        }
    }

    /// End the session with the auth provider.
    ///
    /// If the provider cannot be reached the session is ended locally anyway.
    pub async fn sign_out(&self) -> AuthOutcome {
        match self.auth.end_session().await {
            Ok(()) => AuthOutcome::ok("Signed out"),
            Err(e) => {
                tracing::warn!(error = %e, "Sign-out failed upstream, ending session locally");
                let _ = self.on_auth_event(AuthEvent::SessionEnded).await;
                AuthOutcome::failed(&e)
            }
        }
    }

    /// Ask the auth provider to send a password reset email.
    pub async fn request_password_reset(&self, email: &str) -> AuthOutcome {
        match self.auth.request_password_reset(email.trim()).await {
            Ok(()) => AuthOutcome::ok("Check your inbox for a reset link"),
            Err(e) => {
                tracing::warn!(error = %e, "Password reset request failed");
                AuthOutcome::failed(&e)
            }
        }
    }

    // ─── Accessors ───────────────────────────────────────────────

    pub fn is_authenticated(&self) -> bool {
        *self.authenticated.borrow()
    }

    pub fn current_user(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    pub fn current_user_id(&self) -> Option<String> {
        self.identity.borrow().as_ref().map(|i| i.id.clone())
    }

    /// Session flag stream. Notified on every sign-in (including a switch
    /// to another user) and when the session ends.
    pub fn subscribe_authenticated(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }

    /// Identity stream, notified on every sign-in, sign-out and refresh.
    pub fn subscribe_identity(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    pub fn storage_urls(&self) -> &StorageUrls {
        &self.urls
    }

    // ─── Internals (callers hold `transitions`) ──────────────────

    async fn resolve(&self, user_id: &str) -> Result<Identity> {
        let user = self
            .data
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;
        Ok(Identity::from_user(user, &self.urls))
    }

    fn persist(&self, identity: &Identity) {
        let result = serde_json::to_string(identity)
            .map_err(AppError::from)
            .and_then(|raw| self.slot.store(&raw));
        if let Err(e) = result {
            // The live session still works, it just won't survive a restart.
            tracing::error!(error = %e, "Failed to persist session");
        }
    }

    fn publish(&self, identity: Identity) {
        self.identity.send_replace(Some(identity));
        self.authenticated.send_replace(true);
    }

    fn clear_locked(&self) {
        if let Err(e) = self.slot.clear() {
            tracing::error!(error = %e, "Failed to clear persisted session");
        }
        self.identity.send_replace(None);
        self.authenticated.send_if_modified(|flag| std::mem::replace(flag, false));
    }
}
