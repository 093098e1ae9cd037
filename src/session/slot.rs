// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable key-value slot for the persisted session record.

use crate::error::AppError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Fixed key of the session record.
pub const SESSION_KEY: &str = "gym_app_user";

/// A single durable slot holding the serialized identity.
///
/// Only the session store writes to it.
pub trait SessionSlot: Send + Sync {
    /// Read the raw record. `Ok(None)` when nothing is stored.
    fn load(&self) -> Result<Option<String>, AppError>;

    /// Replace the stored record.
    fn store(&self, value: &str) -> Result<(), AppError>;

    /// Remove the record. Clearing an empty slot is not an error.
    fn clear(&self) -> Result<(), AppError>;
}

/// Slot backed by one JSON file, `<dir>/gym_app_user.json`.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", SESSION_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionSlot for FileSlot {
    fn load(&self) -> Result<Option<String>, AppError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn store(&self, value: &str) -> Result<(), AppError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| AppError::Storage(format!("Failed to create {}: {}", dir.display(), e)))?;
        }

        // Write then rename so a crash never leaves a half-written record.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", self.path.display(), e)))
    }

    fn clear(&self) -> Result<(), AppError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

/// Slot held in memory, lost on restart.
#[derive(Debug, Default)]
pub struct MemorySlot {
    value: Mutex<Option<String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with a raw record.
    pub fn with_record(raw: &str) -> Self {
        Self {
            value: Mutex::new(Some(raw.to_string())),
        }
    }
}

impl SessionSlot for MemorySlot {
    fn load(&self) -> Result<Option<String>, AppError> {
        Ok(self.value.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn store(&self, value: &str) -> Result<(), AppError> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(value.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_slot_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path().join("nested"));

        assert_eq!(slot.load().unwrap(), None);
        slot.clear().expect("clearing an empty slot is fine");

        slot.store(r#"{"id":"u1","name":"Ana"}"#).unwrap();
        assert_eq!(
            slot.load().unwrap().as_deref(),
            Some(r#"{"id":"u1","name":"Ana"}"#)
        );
        assert!(slot.path().ends_with("gym_app_user.json"));

        slot.clear().unwrap();
        assert_eq!(slot.load().unwrap(), None);
    }

    #[test]
    fn test_memory_slot() {
        let slot = MemorySlot::with_record("x");
        assert_eq!(slot.load().unwrap().as_deref(), Some("x"));
        slot.clear().unwrap();
        assert_eq!(slot.load().unwrap(), None);
    }
}
