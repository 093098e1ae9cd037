// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use gym_tracker::db::{DataSource, MemoryBackend};
use gym_tracker::error::AppError;
use gym_tracker::models::{Exercise, NewUser, Routine, User, WorkoutSession};
use gym_tracker::services::StorageUrls;
use gym_tracker::session::{MemorySlot, SessionSlot, SessionStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// How long a test waits for background work before failing.
#[allow(dead_code)]
pub const WAIT: Duration = Duration::from_secs(2);

#[allow(dead_code)]
pub const BASE_URL: &str = "https://project.example.co";

#[allow(dead_code)]
pub fn user(id: &str, name: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        avatar: None,
        created_at: None,
    }
}

/// Backend with two users (u1 Ana, u3 Bea), a small catalogue, two routines
/// and a session owned by u1 and one routine owned by u3. u2 deliberately
/// does not exist.
#[allow(dead_code)]
pub fn fixture_backend() -> Arc<MemoryBackend> {
    let backend = MemoryBackend::new();
    let at = |d: u32| Utc.with_ymd_and_hms(2025, 3, d, 8, 0, 0).unwrap();

    backend.insert_user(user("u1", "Ana"));
    backend.insert_user(user("u3", "Bea"));
    backend.add_account("ana@example.com", "secret1", "u1");

    backend.insert_exercise(Exercise {
        id: "ex1".to_string(),
        name: "Squat".to_string(),
        description: Some("Back squat".to_string()),
        difficulty: 3,
        muscle_group: "legs".to_string(),
        equipment: Some("barbell".to_string()),
        image: Some("squat.png".to_string()),
        created_at: at(1),
    });
    backend.insert_routine(Routine {
        id: "pub1".to_string(),
        user_id: None,
        name: "Starter".to_string(),
        is_public: true,
        created_at: at(1),
    });
    for (id, owner, day) in [("r1", "u1", 2), ("r2", "u1", 3), ("r3", "u3", 5)] {
        backend.insert_routine(Routine {
            id: id.to_string(),
            user_id: Some(owner.to_string()),
            name: format!("Routine {}", id),
            is_public: false,
            created_at: at(day),
        });
    }
    backend.insert_session(WorkoutSession {
        id: "s1".to_string(),
        user_id: Some("u1".to_string()),
        date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
        created_at: at(4),
    });

    Arc::new(backend)
}

/// Store over `backend` (as both auth client and data source).
#[allow(dead_code)]
pub fn store_with(backend: &Arc<MemoryBackend>, slot: Arc<dyn SessionSlot>) -> Arc<SessionStore> {
    Arc::new(SessionStore::new(
        backend.clone(),
        backend.clone(),
        slot,
        StorageUrls::new(BASE_URL),
    ))
}

#[allow(dead_code)]
pub fn memory_store(backend: &Arc<MemoryBackend>) -> Arc<SessionStore> {
    store_with(backend, Arc::new(MemorySlot::new()))
}

/// Wait until the watched value satisfies `pred`, panicking after [`WAIT`].
#[allow(dead_code)]
pub async fn wait_until<T>(mut rx: watch::Receiver<T>, pred: impl FnMut(&T) -> bool) {
    tokio::time::timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("timed out waiting for state")
        .expect("sender dropped");
}

/// Let spawned tasks run for a few scheduler turns.
#[allow(dead_code)]
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Data source that holds user-owned fetches until the gate opens.
///
/// Public fetches and user lookups pass straight through.
#[allow(dead_code)]
pub struct GatedSource {
    inner: Arc<MemoryBackend>,
    gate: watch::Sender<bool>,
    started: AtomicUsize,
}

#[allow(dead_code)]
impl GatedSource {
    pub fn new(inner: Arc<MemoryBackend>) -> Arc<Self> {
        let (gate, _) = watch::channel(false);
        Arc::new(Self {
            inner,
            gate,
            started: AtomicUsize::new(0),
        })
    }

    pub fn open(&self) {
        self.gate.send_replace(true);
    }

    /// Number of gated fetches that have started.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub async fn wait_started(&self, n: usize) {
        tokio::time::timeout(WAIT, async {
            while self.started() < n {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("gated fetches never started");
    }

    async fn pass(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.gate.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }
}

#[async_trait]
impl DataSource for GatedSource {
    async fn all_exercises(&self) -> Result<Vec<Exercise>, AppError> {
        self.inner.all_exercises().await
    }

    async fn public_routines(&self) -> Result<Vec<Routine>, AppError> {
        self.inner.public_routines().await
    }

    async fn user_routines(&self, user_id: &str) -> Result<Vec<Routine>, AppError> {
        self.pass().await;
        self.inner.user_routines(user_id).await
    }

    async fn user_sessions(&self, user_id: &str) -> Result<Vec<WorkoutSession>, AppError> {
        self.pass().await;
        self.inner.user_sessions(user_id).await
    }

    async fn user_by_id(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.inner.user_by_id(user_id).await
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, AppError> {
        self.inner.create_user(user).await
    }
}
