// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process backend: tables, accounts and auth events held in memory.
//!
//! Used when no backend URL is configured and as the test double for both
//! [`DataSource`] and [`AuthClient`]. Tables can be switched into a failing
//! state and every read is counted per table.

use crate::db::{tables, DataSource};
use crate::error::AppError;
use crate::models::{Credentials, Exercise, IdentityRef, NewUser, Routine, User, WorkoutSession};
use crate::services::auth_client::{AuthClient, AuthEvent, AUTH_EVENT_CAPACITY};
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
struct Account {
    user_id: String,
    password: String,
}

/// In-memory backend.
pub struct MemoryBackend {
    users: DashMap<String, User>,
    exercises: DashMap<String, Exercise>,
    routines: DashMap<String, Routine>,
    sessions: DashMap<String, WorkoutSession>,
    /// Accounts keyed by email
    accounts: DashMap<String, Account>,
    /// Tables currently failing, with the error message to return
    failing: DashMap<&'static str, String>,
    /// Read/write calls per table
    calls: DashMap<&'static str, usize>,
    /// Open a session straight from sign-up (no email confirmation)
    auto_confirm: AtomicBool,
    next_id: AtomicU64,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            users: DashMap::new(),
            exercises: DashMap::new(),
            routines: DashMap::new(),
            sessions: DashMap::new(),
            accounts: DashMap::new(),
            failing: DashMap::new(),
            calls: DashMap::new(),
            auto_confirm: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
            events,
        }
    }

    /// Backend pre-filled with a small catalogue and one demo account
    /// (`demo@example.com` / `demo1234`).
    pub fn with_demo_data() -> Self {
        let backend = Self::new();
        let day = |d: u32| Utc.with_ymd_and_hms(2025, 1, d, 9, 0, 0).single().unwrap_or_default();

        backend.insert_user(User {
            id: "demo-user".to_string(),
            name: "Demo".to_string(),
            avatar: None,
            created_at: Some(day(1)),
        });
        backend.add_account("demo@example.com", "demo1234", "demo-user");

        for (i, (name, group)) in [("Squat", "legs"), ("Bench press", "chest"), ("Deadlift", "back")]
            .into_iter()
            .enumerate()
        {
            backend.insert_exercise(Exercise {
                id: format!("ex-{}", i + 1),
                name: name.to_string(),
                description: None,
                difficulty: 3,
                muscle_group: group.to_string(),
                equipment: Some("barbell".to_string()),
                image: None,
                created_at: day(1),
            });
        }

        backend.insert_routine(Routine {
            id: "rt-public".to_string(),
            user_id: None,
            name: "Full body starter".to_string(),
            is_public: true,
            created_at: day(2),
        });
        backend.insert_routine(Routine {
            id: "rt-demo".to_string(),
            user_id: Some("demo-user".to_string()),
            name: "Demo push day".to_string(),
            is_public: false,
            created_at: day(3),
        });
        backend.insert_session(WorkoutSession {
            id: "ws-demo".to_string(),
            user_id: Some("demo-user".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 1, 4).unwrap_or_default(),
            created_at: day(4),
        });

        backend
    }

    // ─── Seeding ─────────────────────────────────────────────────

    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn remove_user(&self, user_id: &str) {
        self.users.remove(user_id);
    }

    pub fn insert_exercise(&self, exercise: Exercise) {
        self.exercises.insert(exercise.id.clone(), exercise);
    }

    pub fn insert_routine(&self, routine: Routine) {
        self.routines.insert(routine.id.clone(), routine);
    }

    pub fn insert_session(&self, session: WorkoutSession) {
        self.sessions.insert(session.id.clone(), session);
    }

    /// Register an account that can sign in with `email` / `password`.
    pub fn add_account(&self, email: &str, password: &str, user_id: &str) {
        self.accounts.insert(
            email.to_lowercase(),
            Account {
                user_id: user_id.to_string(),
                password: password.to_string(),
            },
        );
    }

    pub fn set_auto_confirm(&self, enabled: bool) {
        self.auto_confirm.store(enabled, Ordering::SeqCst);
    }

    // ─── Fault injection and call accounting ─────────────────────

    /// Make every call touching `table` fail with `message`.
    pub fn fail_table(&self, table: &'static str, message: &str) {
        self.failing.insert(table, message.to_string());
    }

    pub fn heal_table(&self, table: &'static str) {
        self.failing.remove(table);
    }

    /// Number of calls that touched `table`.
    pub fn calls(&self, table: &str) -> usize {
        self.calls.get(table).map(|c| *c).unwrap_or(0)
    }

    /// Publish an auth event as if the provider had sent it.
    pub fn emit(&self, event: AuthEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Auth event dropped, no subscribers");
        }
    }

    fn touch(&self, table: &'static str) -> Result<(), AppError> {
        *self.calls.entry(table).or_insert(0) += 1;
        match self.failing.get(table) {
            Some(message) => Err(AppError::Backend(message.clone())),
            None => Ok(()),
        }
    }

    fn allocate_user_id(&self) -> String {
        format!("user-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl DataSource for MemoryBackend {
    async fn all_exercises(&self) -> Result<Vec<Exercise>, AppError> {
        self.touch(tables::EXERCISES)?;
        let mut rows: Vec<Exercise> = self.exercises.iter().map(|e| e.value().clone()).collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn public_routines(&self) -> Result<Vec<Routine>, AppError> {
        self.touch(tables::ROUTINES)?;
        let mut rows: Vec<Routine> = self
            .routines
            .iter()
            .filter(|r| r.is_public)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn user_routines(&self, user_id: &str) -> Result<Vec<Routine>, AppError> {
        self.touch(tables::ROUTINES)?;
        let mut rows: Vec<Routine> = self
            .routines
            .iter()
            .filter(|r| r.user_id.as_deref() == Some(user_id))
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn user_sessions(&self, user_id: &str) -> Result<Vec<WorkoutSession>, AppError> {
        self.touch(tables::SESSIONS)?;
        let mut rows: Vec<WorkoutSession> = self
            .sessions
            .iter()
            .filter(|s| s.user_id.as_deref() == Some(user_id))
            .map(|s| s.value().clone())
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    async fn user_by_id(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.touch(tables::USERS)?;
        Ok(self.users.get(user_id).map(|u| u.value().clone()))
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, AppError> {
        self.touch(tables::USERS)?;
        if self.users.contains_key(&user.id) {
            return Err(AppError::BadRequest(format!("User {} already exists", user.id)));
        }
        let row = User {
            id: user.id.clone(),
            name: user.name.clone(),
            avatar: user.avatar.clone(),
            created_at: Some(Utc::now()),
        };
        self.users.insert(row.id.clone(), row.clone());
        Ok(row)
    }
}

#[async_trait]
impl AuthClient for MemoryBackend {
    async fn verify_credentials(&self, credentials: &Credentials) -> Result<IdentityRef, AppError> {
        let account = self
            .accounts
            .get(&credentials.email.to_lowercase())
            .map(|a| a.value().clone())
            .filter(|a| a.password == credentials.password)
            .ok_or_else(|| AppError::InvalidCredentials("Invalid login credentials".to_string()))?;

        let identity = IdentityRef {
            user_id: account.user_id,
            email: Some(credentials.email.clone()),
        };
        self.emit(AuthEvent::SessionEstablished(identity.clone()));
        Ok(identity)
    }

    async fn register(&self, credentials: &Credentials) -> Result<IdentityRef, AppError> {
        let email = credentials.email.to_lowercase();
        if self.accounts.contains_key(&email) {
            return Err(AppError::InvalidCredentials("User already registered".to_string()));
        }

        let user_id = self.allocate_user_id();
        self.add_account(&email, &credentials.password, &user_id);

        let identity = IdentityRef {
            user_id,
            email: Some(credentials.email.clone()),
        };
        if self.auto_confirm.load(Ordering::SeqCst) {
            self.emit(AuthEvent::SessionEstablished(identity.clone()));
        }
        Ok(identity)
    }

    async fn end_session(&self) -> Result<(), AppError> {
        self.emit(AuthEvent::SessionEnded);
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        // Same answer whether or not the account exists.
        tracing::debug!(
            known = self.accounts.contains_key(&email.to_lowercase()),
            "Password reset requested"
        );
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
