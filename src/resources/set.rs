// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! A named, independently loaded collection with its loading flag.
//!
//! Every fetch takes a generation ticket. `clear()` and newer fetches move
//! the generation on, and `close()` retires the set for good; a result
//! whose ticket is no longer current is dropped without touching state.
//! Checks and writes happen under the watch channel's lock, so a clear
//! can never interleave with an apply.

use crate::error::AppError;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// The resource sets a view can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Exercises,
    PublicRoutines,
    UserRoutines,
    UserSessions,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Exercises,
        ResourceKind::PublicRoutines,
        ResourceKind::UserRoutines,
        ResourceKind::UserSessions,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Exercises => "exercises",
            ResourceKind::PublicRoutines => "public_routines",
            ResourceKind::UserRoutines => "user_routines",
            ResourceKind::UserSessions => "user_sessions",
        }
    }

    /// Owned by the signed-in user, cleared on sign-out.
    pub fn is_user_owned(self) -> bool {
        matches!(self, ResourceKind::UserRoutines | ResourceKind::UserSessions)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Observable state of a set.
#[derive(Debug, Clone)]
pub struct SetState<T> {
    pub items: Arc<Vec<T>>,
    pub loading: bool,
    /// Reason of the last failed fetch, cleared by the next success
    pub last_error: Option<String>,
}

impl<T> Default for SetState<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            loading: false,
            last_error: None,
        }
    }
}

/// What happened to one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Contents replaced with this many items.
    Applied(usize),
    /// Fetch failed; previous contents kept.
    Failed(String),
    /// Result arrived for a stale generation or a closed set.
    Discarded,
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied(_))
    }
}

/// One resource set.
pub struct ResourceSet<T> {
    kind: ResourceKind,
    state: watch::Sender<SetState<T>>,
    generation: AtomicU64,
    closed: AtomicBool,
}

impl<T: Clone + Send + Sync> ResourceSet<T> {
    pub fn new(kind: ResourceKind) -> Self {
        let (state, _) = watch::channel(SetState::default());
        Self {
            kind,
            state,
            generation: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn snapshot(&self) -> SetState<T> {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.state.borrow().items)
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().last_error.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SetState<T>> {
        self.state.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Run `fetch` and apply its result if this fetch is still current.
    ///
    /// The loading flag is raised for the duration and always lowered
    /// afterwards, including when the future is dropped mid-flight.
    pub async fn fetch<F>(&self, fetch: F) -> FetchOutcome
    where
        F: Future<Output = Result<Vec<T>, AppError>>,
    {
        let Some(ticket) = self.begin() else {
            tracing::debug!(set = %self.kind, "Set closed, fetch skipped");
            return FetchOutcome::Discarded;
        };

        let mut pending = PendingFetch {
            set: self,
            ticket,
            settled: false,
        };
        let result = fetch.await;
        pending.settled = true;

        self.finish(ticket, result)
    }

    /// Empty the set without fetching. In-flight fetches become stale.
    pub fn clear(&self) {
        self.state.send_if_modified(|state| {
            if self.closed.load(Ordering::SeqCst) {
                return false;
            }
            self.generation.fetch_add(1, Ordering::SeqCst);
            *state = SetState::default();
            true
        });
    }

    /// Retire the set. Nothing mutates it afterwards.
    pub fn close(&self) {
        self.state.send_if_modified(|_| {
            self.closed.store(true, Ordering::SeqCst);
            false
        });
    }

    fn begin(&self) -> Option<u64> {
        let mut ticket = None;
        self.state.send_if_modified(|state| {
            if self.closed.load(Ordering::SeqCst) {
                return false;
            }
            ticket = Some(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
            let changed = !state.loading;
            state.loading = true;
            changed
        });
        ticket
    }

    fn is_current(&self, ticket: u64) -> bool {
        !self.closed.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == ticket
    }

    fn finish(&self, ticket: u64, result: Result<Vec<T>, AppError>) -> FetchOutcome {
        let mut outcome = FetchOutcome::Discarded;
        self.state.send_if_modified(|state| {
            if !self.is_current(ticket) {
                return false;
            }
            state.loading = false;
            outcome = match result {
                Ok(items) => {
                    let count = items.len();
                    state.items = Arc::new(items);
                    state.last_error = None;
                    FetchOutcome::Applied(count)
                }
                Err(e) => {
                    let reason = e.to_string();
                    state.last_error = Some(reason.clone());
                    FetchOutcome::Failed(reason)
                }
            };
            true
        });

        match &outcome {
            FetchOutcome::Applied(count) => tracing::info!(set = %self.kind, count, "Set loaded"),
            FetchOutcome::Failed(reason) => {
                tracing::error!(set = %self.kind, error = %reason, "Failed to load set")
            }
            FetchOutcome::Discarded => {
                tracing::debug!(set = %self.kind, ticket, "Stale fetch result discarded")
            }
        }
        outcome
    }
}

/// Lowers the loading flag if a fetch is dropped before it settles.
struct PendingFetch<'a, T> {
    set: &'a ResourceSet<T>,
    ticket: u64,
    settled: bool,
}

impl<T> Drop for PendingFetch<'_, T> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let set = self.set;
        let ticket = self.ticket;
        set.state.send_if_modified(|state| {
            let current = !set.closed.load(Ordering::SeqCst)
                && set.generation.load(Ordering::SeqCst) == ticket;
            if current && state.loading {
                state.loading = false;
                true
            } else {
                false
            }
        });
        tracing::debug!(set = %set.kind, ticket, "Fetch abandoned before completion");
    }
}
