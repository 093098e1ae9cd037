// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login screen state: sign-in form, password reset and sign-out.

use crate::session::{AuthOutcome, SessionStore};
use crate::views::forms::{check_reset_email, SignInForm};
use std::sync::Arc;

/// State behind the login screen.
pub struct LoginView {
    store: Arc<SessionStore>,
    pub form: SignInForm,
    pub loading: bool,
    pub error_message: String,
    pub show_forgot_password: bool,
    pub reset_message: String,
}

impl LoginView {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            store,
            form: SignInForm::default(),
            loading: false,
            error_message: String::new(),
            show_forgot_password: false,
            reset_message: String::new(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    /// Validate and submit the sign-in form.
    ///
    /// Returns whether the provider accepted the credentials; the session
    /// itself arrives through the store's event stream.
    pub async fn submit(&mut self) -> bool {
        self.error_message.clear();

        let credentials = match self.form.check() {
            Ok(credentials) => credentials,
            Err(message) => {
                self.error_message = message;
                return false;
            }
        };

        self.loading = true;
        let outcome = self.store.sign_in(&credentials).await;
        self.loading = false;

        if !outcome.success {
            self.error_message = outcome.message;
        }
        outcome.success
    }

    pub fn toggle_forgot_password(&mut self) {
        self.show_forgot_password = !self.show_forgot_password;
        self.reset_message.clear();
    }

    /// Ask for a password reset email.
    pub async fn send_password_reset(&mut self, email: &str) -> bool {
        let email = match check_reset_email(email) {
            Ok(email) => email,
            Err(message) => {
                self.reset_message = message;
                return false;
            }
        };

        let outcome = self.store.request_password_reset(&email).await;
        self.reset_message = outcome.message;
        outcome.success
    }

    pub async fn sign_out(&mut self) -> AuthOutcome {
        self.store.sign_out().await
    }

    /// Sign in by user id, bypassing credentials.
    pub async fn login_by_id(&mut self, user_id: &str) -> bool {
        tracing::warn!("Using direct login by id");
        self.error_message.clear();
        self.loading = true;
        let result = self.store.login(user_id).await;
        self.loading = false;

        match result {
            Ok(_) => true,
            Err(e) => {
                self.error_message = e.user_message();
                false
            }
        }
    }
}
