// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod exercise;
pub mod routine;
pub mod user;

pub use exercise::Exercise;
pub use routine::{Routine, WorkoutSession};
pub use user::{Credentials, Identity, IdentityRef, NewUser, User};
