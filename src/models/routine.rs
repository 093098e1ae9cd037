// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Routine and workout session models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Routine row in the `routines` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Routine {
    pub id: String,
    /// Owner (None for catalogue routines)
    pub user_id: Option<String>,
    pub name: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

/// A logged workout, row in the `sessions` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkoutSession {
    pub id: String,
    pub user_id: Option<String>,
    /// Day the workout took place
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}
