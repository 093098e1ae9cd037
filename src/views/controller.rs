// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! View controllers: keep a view's resource sets in step with the session.
//!
//! On start a controller:
//! 1. watches the session flag (current value first); `true` loads the
//!    user-owned sets for the current user, `false` clears them
//! 2. mirrors the current identity for display
//! 3. loads the public sets once
//!
//! If the flag changes while a user load is in flight, that load is
//! abandoned and the new value handled. `teardown` retires the sets and
//! stops every task, so nothing the controller exposes changes afterwards.
//! Every channel the controller owns checks `active` under its own lock,
//! which keeps that true on a multi-threaded runtime as well.

use crate::db::DataSource;
use crate::models::Identity;
use crate::resources::{LoadReport, ResourceKind, ResourceLoader, ResourceScope};
use crate::session::SessionStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;

/// How far a controller's loads have got.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewStatus {
    /// The one-off public load has settled (or there is none in scope).
    pub public_loaded: bool,
    /// User whose sets were last loaded; `None` once they are cleared.
    /// Stays `None` for screens without user-owned sets.
    pub user_loaded: Option<String>,
}

/// Controller behind one screen.
pub struct ViewController {
    name: &'static str,
    loader: Arc<ResourceLoader>,
    /// Local copy of the signed-in identity
    display_user: Arc<watch::Sender<Option<Identity>>>,
    /// Local copy of the session flag
    authenticated: Arc<watch::Sender<bool>>,
    status: Arc<watch::Sender<ViewStatus>>,
    active: Arc<AtomicBool>,
    tasks: JoinSet<()>,
}

impl ViewController {
    /// Start a controller for the sets in `scope`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(
        name: &'static str,
        store: Arc<SessionStore>,
        data: Arc<dyn DataSource>,
        scope: ResourceScope,
    ) -> Self {
        let load_public = [ResourceKind::Exercises, ResourceKind::PublicRoutines]
            .into_iter()
            .any(|k| scope.contains(k));
        let watch_session = scope.has_user_sets();

        let loader = Arc::new(ResourceLoader::new(data, scope));
        let (display_user, _) = watch::channel(store.current_user());
        let (authenticated, _) = watch::channel(store.is_authenticated());
        let (status, _) = watch::channel(ViewStatus {
            public_loaded: !load_public,
            user_loaded: None,
        });
        let mut controller = Self {
            name,
            loader,
            display_user: Arc::new(display_user),
            authenticated: Arc::new(authenticated),
            status: Arc::new(status),
            active: Arc::new(AtomicBool::new(true)),
            tasks: JoinSet::new(),
        };

        controller.spawn_session_watch(&store, watch_session);
        controller.spawn_identity_mirror(&store);
        if load_public {
            let loader = Arc::clone(&controller.loader);
            let status = Arc::clone(&controller.status);
            let active = Arc::clone(&controller.active);
            controller.tasks.spawn(async move {
                let report = loader.load_public().await;
                log_report(name, "public", &report);
                send_if_active(&status, &active, |s| {
                    !std::mem::replace(&mut s.public_loaded, true)
                });
            });
        }

        tracing::debug!(view = name, "View controller started");
        controller
    }

    // ─── Presets for the app's screens ───────────────────────────

    /// Exercise catalogue plus everything the user owns.
    pub fn exercise_list(store: Arc<SessionStore>, data: Arc<dyn DataSource>) -> Self {
        Self::start("exercise_list", store, data, ResourceScope::all())
    }

    pub fn routines_public(store: Arc<SessionStore>, data: Arc<dyn DataSource>) -> Self {
        Self::start(
            "routines_public",
            store,
            data,
            ResourceScope::new(&[ResourceKind::PublicRoutines]),
        )
    }

    pub fn routines_user(store: Arc<SessionStore>, data: Arc<dyn DataSource>) -> Self {
        Self::start(
            "routines_user",
            store,
            data,
            ResourceScope::new(&[ResourceKind::UserRoutines, ResourceKind::UserSessions]),
        )
    }

    pub fn sessions_user(store: Arc<SessionStore>, data: Arc<dyn DataSource>) -> Self {
        Self::start(
            "sessions_user",
            store,
            data,
            ResourceScope::new(&[ResourceKind::UserSessions]),
        )
    }

    // ─── Accessors ───────────────────────────────────────────────

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn loader(&self) -> &Arc<ResourceLoader> {
        &self.loader
    }

    pub fn current_user(&self) -> Option<Identity> {
        self.display_user.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        *self.authenticated.borrow()
    }

    pub fn subscribe_current_user(&self) -> watch::Receiver<Option<Identity>> {
        self.display_user.subscribe()
    }

    /// Load progress, for callers that need to wait until data is in.
    pub fn subscribe_status(&self) -> watch::Receiver<ViewStatus> {
        self.status.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Release every subscription and retire the sets.
    pub fn teardown(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        // Wait out any update that passed the check before the swap.
        self.display_user.send_if_modified(|_| false);
        self.authenticated.send_if_modified(|_| false);
        self.status.send_if_modified(|_| false);
        self.loader.close();
        self.tasks.abort_all();
        tracing::debug!(view = self.name, "View controller torn down");
    }

    // ─── Tasks ───────────────────────────────────────────────────

    fn spawn_session_watch(&mut self, store: &Arc<SessionStore>, load_user_sets: bool) {
        let mut flag = store.subscribe_authenticated();
        let store = Arc::clone(store);
        let loader = Arc::clone(&self.loader);
        let mirror = Arc::clone(&self.authenticated);
        let status = Arc::clone(&self.status);
        let active = Arc::clone(&self.active);
        let name = self.name;

        self.tasks.spawn(async move {
            loop {
                let authenticated = *flag.borrow_and_update();
                send_if_active(&mirror, &active, |v| {
                    std::mem::replace(v, authenticated) != authenticated
                });
                if !active.load(Ordering::SeqCst) {
                    break;
                }

                if load_user_sets {
                    let apply = async {
                        if authenticated {
                            if let Some(user_id) = store.current_user_id() {
                                let report = loader.load_user(&user_id).await;
                                log_report(name, "user", &report);
                                send_if_active(&status, &active, |s| {
                                    s.user_loaded.replace(user_id) != s.user_loaded
                                });
                            }
                        } else {
                            loader.clear_user();
                            send_if_active(&status, &active, |s| s.user_loaded.take().is_some());
                        }
                    };

                    tokio::select! {
                        _ = apply => {
                            if flag.changed().await.is_err() {
                                break;
                            }
                        }
                        changed = flag.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            tracing::debug!(view = name, "Session changed mid-load, restarting");
                        }
                    }
                } else if flag.changed().await.is_err() {
                    break;
                }
            }
        });
    }

    fn spawn_identity_mirror(&mut self, store: &Arc<SessionStore>) {
        let mut identity = store.subscribe_identity();
        let mirror = Arc::clone(&self.display_user);
        let active = Arc::clone(&self.active);

        self.tasks.spawn(async move {
            loop {
                let current = identity.borrow_and_update().clone();
                send_if_active(&mirror, &active, |v| {
                    *v = current;
                    true
                });
                if !active.load(Ordering::SeqCst) {
                    break;
                }
                if identity.changed().await.is_err() {
                    break;
                }
            }
        });
    }
}

impl Drop for ViewController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Apply `update` only while the controller is active. The check runs under
/// the channel's lock, so it cannot interleave with `shutdown`.
fn send_if_active<T>(
    tx: &watch::Sender<T>,
    active: &AtomicBool,
    update: impl FnOnce(&mut T) -> bool,
) -> bool {
    tx.send_if_modified(|value| active.load(Ordering::SeqCst) && update(value))
}

fn log_report(view: &str, label: &str, report: &LoadReport) {
    let failed = report.failures();
    if failed.is_empty() {
        tracing::debug!(view, label, sets = report.outcomes.len(), "Load settled");
    } else {
        tracing::warn!(view, label, failed = ?failed, "Load settled with failures");
    }
}
