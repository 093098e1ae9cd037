// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resource loader: the sets a view shows and the fan-in loads that fill them.
//!
//! `load_public` and `load_user` start every in-scope fetch at once and
//! return only when all of them have settled. A failing fetch never
//! cancels or delays its siblings.

use crate::db::DataSource;
use crate::models::{Exercise, Routine, WorkoutSession};
use crate::resources::set::{FetchOutcome, ResourceKind, ResourceSet};
use futures_util::future::join;
use std::future::Future;
use std::sync::Arc;

/// Which sets a view uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceScope {
    kinds: Vec<ResourceKind>,
}

impl ResourceScope {
    pub fn new(kinds: &[ResourceKind]) -> Self {
        let mut unique = Vec::with_capacity(kinds.len());
        for kind in kinds {
            if !unique.contains(kind) {
                unique.push(*kind);
            }
        }
        Self { kinds: unique }
    }

    pub fn all() -> Self {
        Self::new(&ResourceKind::ALL)
    }

    pub fn contains(&self, kind: ResourceKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn has_user_sets(&self) -> bool {
        self.kinds.iter().any(|k| k.is_user_owned())
    }
}

/// Per-set outcomes of one fan-in load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub outcomes: Vec<(ResourceKind, FetchOutcome)>,
}

impl LoadReport {
    fn collect<const N: usize>(outcomes: [Option<(ResourceKind, FetchOutcome)>; N]) -> Self {
        Self {
            outcomes: outcomes.into_iter().flatten().collect(),
        }
    }

    pub fn outcome(&self, kind: ResourceKind) -> Option<&FetchOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, outcome)| outcome)
    }

    pub fn failures(&self) -> Vec<ResourceKind> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, FetchOutcome::Failed(_)))
            .map(|(kind, _)| *kind)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Owns one set per kind and fills them from a [`DataSource`].
pub struct ResourceLoader {
    data: Arc<dyn DataSource>,
    scope: ResourceScope,
    exercises: ResourceSet<Exercise>,
    public_routines: ResourceSet<Routine>,
    user_routines: ResourceSet<Routine>,
    user_sessions: ResourceSet<WorkoutSession>,
}

impl ResourceLoader {
    pub fn new(data: Arc<dyn DataSource>, scope: ResourceScope) -> Self {
        Self {
            data,
            scope,
            exercises: ResourceSet::new(ResourceKind::Exercises),
            public_routines: ResourceSet::new(ResourceKind::PublicRoutines),
            user_routines: ResourceSet::new(ResourceKind::UserRoutines),
            user_sessions: ResourceSet::new(ResourceKind::UserSessions),
        }
    }

    pub fn scope(&self) -> &ResourceScope {
        &self.scope
    }

    pub fn exercises(&self) -> &ResourceSet<Exercise> {
        &self.exercises
    }

    pub fn public_routines(&self) -> &ResourceSet<Routine> {
        &self.public_routines
    }

    pub fn user_routines(&self) -> &ResourceSet<Routine> {
        &self.user_routines
    }

    pub fn user_sessions(&self) -> &ResourceSet<WorkoutSession> {
        &self.user_sessions
    }

    /// Loading flag of any set by kind.
    pub fn is_loading(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Exercises => self.exercises.is_loading(),
            ResourceKind::PublicRoutines => self.public_routines.is_loading(),
            ResourceKind::UserRoutines => self.user_routines.is_loading(),
            ResourceKind::UserSessions => self.user_sessions.is_loading(),
        }
    }

    // ─── Single fetches ──────────────────────────────────────────

    pub async fn load_exercises(&self) -> FetchOutcome {
        self.exercises.fetch(self.data.all_exercises()).await
    }

    pub async fn load_public_routines(&self) -> FetchOutcome {
        self.public_routines.fetch(self.data.public_routines()).await
    }

    pub async fn load_user_routines(&self, user_id: &str) -> FetchOutcome {
        self.user_routines
            .fetch(self.data.user_routines(user_id))
            .await
    }

    pub async fn load_user_sessions(&self, user_id: &str) -> FetchOutcome {
        self.user_sessions
            .fetch(self.data.user_sessions(user_id))
            .await
    }

    // ─── Fan-in loads ────────────────────────────────────────────

    /// Load every public set in scope.
    pub async fn load_public(&self) -> LoadReport {
        let (exercises, routines) = join(
            self.scoped(ResourceKind::Exercises, self.load_exercises()),
            self.scoped(ResourceKind::PublicRoutines, self.load_public_routines()),
        )
        .await;
        LoadReport::collect([exercises, routines])
    }

    /// Load every user-owned set in scope for `user_id`.
    pub async fn load_user(&self, user_id: &str) -> LoadReport {
        tracing::debug!(user_id, "Loading user data");
        let (routines, sessions) = join(
            self.scoped(ResourceKind::UserRoutines, self.load_user_routines(user_id)),
            self.scoped(ResourceKind::UserSessions, self.load_user_sessions(user_id)),
        )
        .await;
        LoadReport::collect([routines, sessions])
    }

    /// Empty the user-owned sets without fetching.
    pub fn clear_user(&self) {
        self.user_routines.clear();
        self.user_sessions.clear();
    }

    /// Retire every set; later results are discarded.
    pub fn close(&self) {
        self.exercises.close();
        self.public_routines.close();
        self.user_routines.close();
        self.user_sessions.close();
    }

    /// Run `fetch` only if `kind` is in scope. Out-of-scope futures are
    /// dropped unpolled, so no request is made.
    async fn scoped<F>(&self, kind: ResourceKind, fetch: F) -> Option<(ResourceKind, FetchOutcome)>
    where
        F: Future<Output = FetchOutcome>,
    {
        if !self.scope.contains(kind) {
            return None;
        }
        Some((kind, fetch.await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{tables, MemoryBackend};
    use rstest::rstest;

    #[test]
    fn test_scope_dedups() {
        let scope = ResourceScope::new(&[ResourceKind::UserSessions, ResourceKind::UserSessions]);
        assert!(scope.contains(ResourceKind::UserSessions));
        assert!(!scope.contains(ResourceKind::Exercises));
        assert!(scope.has_user_sets());
        assert!(!ResourceScope::new(&[ResourceKind::Exercises]).has_user_sets());
    }

    #[rstest]
    #[case(ResourceScope::all(), 2)]
    #[case(ResourceScope::new(&[ResourceKind::PublicRoutines]), 1)]
    #[case(ResourceScope::new(&[ResourceKind::UserRoutines]), 0)]
    #[tokio::test]
    async fn test_load_public_respects_scope(#[case] scope: ResourceScope, #[case] fetched: usize) {
        let backend = Arc::new(MemoryBackend::with_demo_data());
        let loader = ResourceLoader::new(backend.clone(), scope);

        let report = loader.load_public().await;

        assert_eq!(report.outcomes.len(), fetched);
        assert_eq!(
            backend.calls(tables::EXERCISES) + backend.calls(tables::ROUTINES),
            fetched
        );
    }

    #[tokio::test]
    async fn test_load_user_isolates_failures() {
        let backend = Arc::new(MemoryBackend::with_demo_data());
        backend.fail_table(tables::SESSIONS, "sessions down");
        let loader = ResourceLoader::new(backend.clone(), ResourceScope::all());

        let report = loader.load_user("demo-user").await;

        assert_eq!(
            report.outcome(ResourceKind::UserRoutines),
            Some(&FetchOutcome::Applied(1))
        );
        assert_eq!(report.failures(), vec![ResourceKind::UserSessions]);
        assert_eq!(loader.user_routines().items().len(), 1);
        assert!(loader.user_sessions().items().is_empty());
        assert!(!loader.is_loading(ResourceKind::UserRoutines));
        assert!(!loader.is_loading(ResourceKind::UserSessions));
    }
}
