// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session layer: persisted slot and the session store.

pub mod slot;
pub mod store;

pub use slot::{FileSlot, MemorySlot, SessionSlot, SESSION_KEY};
pub use store::SessionStore;

use crate::error::AppError;

/// Result of a direct user action, ready to show in a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub success: bool,
    pub message: String,
}

impl AuthOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(error: &AppError) -> Self {
        Self {
            success: false,
            message: error.user_message(),
        }
    }
}
