//! Data layer: typed reads of the backend's tables.

pub mod memory;
pub mod rest;

pub use memory::MemoryBackend;
pub use rest::RestDataSource;

use crate::error::AppError;
use crate::models::{Exercise, NewUser, Routine, User, WorkoutSession};
use async_trait::async_trait;

/// Table names as constants.
pub mod tables {
    pub const USERS: &str = "users";
    pub const EXERCISES: &str = "exercises";
    pub const ROUTINES: &str = "routines";
    /// Logged workouts
    pub const SESSIONS: &str = "sessions";
}

/// Fetchers the resource loader and session store read through.
///
/// Every call is independently failable; callers decide whether a failure
/// is surfaced or only recorded.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Whole exercise catalogue.
    async fn all_exercises(&self) -> Result<Vec<Exercise>, AppError>;

    /// Public routines, newest first.
    async fn public_routines(&self) -> Result<Vec<Routine>, AppError>;

    /// Routines owned by `user_id`, newest first.
    async fn user_routines(&self, user_id: &str) -> Result<Vec<Routine>, AppError>;

    /// Workouts logged by `user_id`, most recent date first.
    async fn user_sessions(&self, user_id: &str) -> Result<Vec<WorkoutSession>, AppError>;

    /// Look up a user profile. `Ok(None)` when no such user exists.
    async fn user_by_id(&self, user_id: &str) -> Result<Option<User>, AppError>;

    /// Insert a user profile and return the stored row.
    async fn create_user(&self, user: &NewUser) -> Result<User, AppError>;
}
