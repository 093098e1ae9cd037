// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Exercise catalogue model.

use crate::services::StorageUrls;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Exercise row in the `exercises` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Difficulty from 1 (easy) to 5 (hard)
    pub difficulty: u8,
    pub muscle_group: String,
    pub equipment: Option<String>,
    /// Image file name in the `exercises` bucket
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Exercise {
    /// Public image URL, or the placeholder when the exercise has none.
    pub fn image_url(&self, urls: &StorageUrls) -> String {
        urls.exercise_image_or_default(self.image.as_deref())
    }
}
