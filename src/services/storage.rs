// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public URLs for files in the backend's object storage.

/// Bucket holding user avatars.
const AVATARS_BUCKET: &str = "avatars";
/// Bucket holding exercise pictures.
const EXERCISES_BUCKET: &str = "exercises";

pub const DEFAULT_AVATAR: &str = "/assets/images/default-avatar.png";
pub const DEFAULT_EXERCISE_IMAGE: &str = "/assets/images/default-exercise.png";

/// Builds public object URLs under a backend base URL.
#[derive(Debug, Clone)]
pub struct StorageUrls {
    base_url: String,
}

impl StorageUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn public_object_url(&self, bucket: &str, file: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            bucket,
            urlencoding::encode(file)
        )
    }

    pub fn avatar_url(&self, file: &str) -> String {
        self.public_object_url(AVATARS_BUCKET, file)
    }

    pub fn exercise_image_url(&self, file: &str) -> String {
        self.public_object_url(EXERCISES_BUCKET, file)
    }

    /// Avatar URL, or the bundled placeholder.
    pub fn avatar_or_default(&self, file: Option<&str>) -> String {
        match file {
            Some(f) if !f.is_empty() => self.avatar_url(f),
            _ => DEFAULT_AVATAR.to_string(),
        }
    }

    /// Exercise image URL, or the bundled placeholder.
    pub fn exercise_image_or_default(&self, file: Option<&str>) -> String {
        match file {
            Some(f) if !f.is_empty() => self.exercise_image_url(f),
            _ => DEFAULT_EXERCISE_IMAGE.to_string(),
        }
    }
}
