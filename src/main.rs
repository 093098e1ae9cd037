// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym-Tracker headless client
//!
//! Restores the saved session, optionally signs in, loads the exercise list
//! screen and logs what it sees.

use gym_tracker::{
    config::Config,
    resources::{ResourceKind, SetState},
    views::{LoginView, SignInForm, ViewController},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    let wait = config.fetch_timeout;
    tracing::info!(offline = config.is_offline(), "Starting Gym-Tracker client");

    let state = AppState::build(config)?;
    let restored = state.session.restore().await;
    tracing::info!(restored, "Session restore finished");

    let pump = state.session.spawn_event_pump();
    let view = ViewController::exercise_list(state.session.clone(), state.data.clone());

    // Optional credential sign-in
    if let (Ok(email), Ok(password)) = (std::env::var("GYM_EMAIL"), std::env::var("GYM_PASSWORD")) {
        let mut login = LoginView::new(state.session.clone());
        login.form = SignInForm::new(&email, &password);
        if login.submit().await {
            let mut flag = state.session.subscribe_authenticated();
            if tokio::time::timeout(wait, flag.wait_for(|authenticated| *authenticated))
                .await
                .is_err()
            {
                tracing::warn!("Sign-in accepted but no session arrived in time");
            }
        } else {
            tracing::warn!(error = %login.error_message, "Sign-in failed");
        }
    }

    // Wait until the public sets and the signed-in user's sets are in.
    let expected = state.session.current_user_id();
    let mut status = view.subscribe_status();
    let loaded = status.wait_for(|s| s.public_loaded && s.user_loaded == expected);
    if tokio::time::timeout(wait, loaded).await.is_err() {
        tracing::warn!("Timed out waiting for loads to settle");
    }

    let loader = view.loader();

    for kind in ResourceKind::ALL {
        let (count, error) = match kind {
            ResourceKind::Exercises => summary(&loader.exercises().snapshot()),
            ResourceKind::PublicRoutines => summary(&loader.public_routines().snapshot()),
            ResourceKind::UserRoutines => summary(&loader.user_routines().snapshot()),
            ResourceKind::UserSessions => summary(&loader.user_sessions().snapshot()),
        };
        tracing::info!(set = %kind, count, error = ?error, "Resource set");
    }

    match view.current_user() {
        Some(user) => {
            let avatar = state.session.storage_urls().avatar_or_default(user.avatar.as_deref());
            tracing::info!(user_id = %user.id, name = %user.name, avatar = %avatar, "Signed in")
        }
        None => tracing::info!("Not signed in"),
    }

    view.teardown();
    pump.abort();
    Ok(())
}

fn summary<T>(state: &SetState<T>) -> (usize, Option<String>) {
    (state.items.len(), state.last_error.clone())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gym_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
