// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - backend-facing collaborators.

pub mod auth_client;
pub mod storage;

pub use auth_client::{AuthClient, AuthEvent, RestAuthClient};
pub use storage::StorageUrls;
