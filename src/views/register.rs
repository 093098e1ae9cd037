// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration screen state.

use crate::session::SessionStore;
use crate::views::forms::SignUpForm;
use std::sync::Arc;

/// State behind the registration screen.
pub struct RegisterView {
    store: Arc<SessionStore>,
    pub form: SignUpForm,
    pub loading: bool,
    pub error_message: String,
    pub success_message: String,
}

impl RegisterView {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            store,
            form: SignUpForm::default(),
            loading: false,
            error_message: String::new(),
            success_message: String::new(),
        }
    }

    /// Validate and submit the registration form.
    pub async fn submit(&mut self) -> bool {
        self.error_message.clear();
        self.success_message.clear();

        let (credentials, name) = match self.form.check() {
            Ok(checked) => checked,
            Err(message) => {
                self.error_message = message;
                return false;
            }
        };

        self.loading = true;
        let outcome = self.store.sign_up(&credentials, &name).await;
        self.loading = false;

        if outcome.success {
            self.success_message = outcome.message;
        } else {
            self.error_message = outcome.message;
        }
        outcome.success
    }
}
