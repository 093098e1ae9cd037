// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tests for session restore, auth events and the credential actions.

use gym_tracker::db::tables;
use gym_tracker::models::{Credentials, IdentityRef};
use gym_tracker::services::AuthEvent;
use gym_tracker::session::{FileSlot, MemorySlot, SessionSlot};
use rstest::rstest;
use std::sync::Arc;

mod common;
use common::{fixture_backend, memory_store, store_with, user, wait_until};

fn established(user_id: &str) -> AuthEvent {
    AuthEvent::SessionEstablished(IdentityRef::new(user_id))
}

// ─── Restore ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_restore_valid_record() {
    let backend = fixture_backend();
    let slot = Arc::new(MemorySlot::with_record(r#"{"id":"u1","name":"Ana"}"#));
    let store = store_with(&backend, slot);

    assert!(store.restore().await);
    assert!(store.is_authenticated());
    let identity = store.current_user().unwrap();
    assert_eq!(identity.id, "u1");
    assert_eq!(identity.name, "Ana");

    // Restore trusts the record and does not hit the backend.
    assert_eq!(backend.calls(tables::USERS), 0);
}

#[rstest]
#[case("not json")]
#[case("{\"id\":\"u1\"}")]
#[case("{\"id\":\"\",\"name\":\"Ana\"}")]
#[case("[]")]
#[tokio::test]
async fn test_restore_malformed_record_clears_slot(#[case] raw: &str) {
    let backend = fixture_backend();
    let slot = Arc::new(MemorySlot::with_record(raw));
    let store = store_with(&backend, slot.clone());

    assert!(!store.restore().await);
    assert!(!store.is_authenticated());
    assert!(store.current_user().is_none());
    assert_eq!(slot.load().unwrap(), None);

    // Running it again changes nothing.
    assert!(!store.restore().await);
    assert_eq!(slot.load().unwrap(), None);
}

#[tokio::test]
async fn test_restore_empty_slot() {
    let backend = fixture_backend();
    let store = memory_store(&backend);

    assert!(!store.restore().await);
    assert!(store.current_user().is_none());
}

#[tokio::test]
async fn test_session_survives_restart_with_file_slot() {
    let dir = tempfile::tempdir().unwrap();
    let backend = fixture_backend();

    let first = store_with(&backend, Arc::new(FileSlot::new(dir.path())));
    first.on_auth_event(established("u1")).await.unwrap();
    drop(first);

    let second = store_with(&backend, Arc::new(FileSlot::new(dir.path())));
    assert!(second.restore().await);
    assert_eq!(second.current_user_id().as_deref(), Some("u1"));

    second.on_auth_event(AuthEvent::SessionEnded).await.unwrap();
    let third = store_with(&backend, Arc::new(FileSlot::new(dir.path())));
    assert!(!third.restore().await);
}

// ─── Auth events ─────────────────────────────────────────────────

#[tokio::test]
async fn test_established_event_persists_identity() {
    let backend = fixture_backend();
    let slot = Arc::new(MemorySlot::new());
    let store = store_with(&backend, slot.clone());

    store.on_auth_event(established("u1")).await.unwrap();

    assert!(store.is_authenticated());
    assert_eq!(store.current_user().unwrap().name, "Ana");
    let raw = slot.load().unwrap().expect("record persisted");
    assert!(raw.contains("\"id\":\"u1\""));
}

#[tokio::test]
async fn test_unresolvable_user_leaves_state_unchanged() {
    let backend = fixture_backend();
    let slot = Arc::new(MemorySlot::new());
    let store = store_with(&backend, slot.clone());

    // From signed out.
    assert!(store.on_auth_event(established("u2")).await.is_err());
    assert!(!store.is_authenticated());
    assert!(store.current_user().is_none());
    assert_eq!(slot.load().unwrap(), None);

    // From signed in as someone else.
    store.on_auth_event(established("u1")).await.unwrap();
    assert!(store.on_auth_event(established("u2")).await.is_err());
    assert!(store.is_authenticated());
    assert_eq!(store.current_user_id().as_deref(), Some("u1"));
}

#[tokio::test]
async fn test_lookup_failure_leaves_state_unchanged() {
    let backend = fixture_backend();
    let store = memory_store(&backend);
    backend.fail_table(tables::USERS, "connection reset");

    assert!(store.on_auth_event(established("u1")).await.is_err());
    assert!(!store.is_authenticated());
}

#[rstest]
#[case(&[Some("u1")], Some("u1"))]
#[case(&[Some("u1"), None], None)]
#[case(&[None, Some("u3")], Some("u3"))]
#[case(&[Some("u1"), Some("u3")], Some("u3"))]
#[case(&[Some("u1"), Some("u2")], Some("u1"))]
#[case(&[Some("u2")], None)]
#[case(&[Some("u1"), None, None], None)]
#[tokio::test]
async fn test_event_sequences(#[case] events: &[Option<&str>], #[case] expected: Option<&str>) {
    let backend = fixture_backend();
    let store = memory_store(&backend);

    for event in events {
        let event = match event {
            Some(user_id) => established(user_id),
            None => AuthEvent::SessionEnded,
        };
        let _ = store.on_auth_event(event).await;
    }

    assert_eq!(store.current_user_id().as_deref(), expected);
    assert_eq!(store.is_authenticated(), expected.is_some());
}

#[tokio::test]
async fn test_flag_notifies_every_sign_in() {
    let backend = fixture_backend();
    let store = memory_store(&backend);
    let mut flag = store.subscribe_authenticated();

    // Ending a session that never started is silent.
    store.on_auth_event(AuthEvent::SessionEnded).await.unwrap();
    assert!(!flag.has_changed().unwrap());

    store.on_auth_event(established("u1")).await.unwrap();
    assert!(flag.has_changed().unwrap());
    assert!(*flag.borrow_and_update());

    // Switching users re-notifies so subscribers reload for u3.
    store.on_auth_event(established("u3")).await.unwrap();
    assert!(flag.has_changed().unwrap());
    assert!(*flag.borrow_and_update());
    assert_eq!(store.current_user_id().as_deref(), Some("u3"));

    // A dropped event does not.
    assert!(store.on_auth_event(established("u2")).await.is_err());
    assert!(!flag.has_changed().unwrap());

    store.on_auth_event(AuthEvent::SessionEnded).await.unwrap();
    assert!(flag.has_changed().unwrap());
    assert!(!*flag.borrow_and_update());
}

#[tokio::test]
async fn test_identity_set_before_flag_rises() {
    let backend = fixture_backend();
    let store = memory_store(&backend);
    let mut flag = store.subscribe_authenticated();

    let observer = {
        let store = store.clone();
        tokio::spawn(async move {
            flag.wait_for(|v| *v).await.unwrap();
            let seen_up = store.current_user_id();
            flag.wait_for(|v| !*v).await.unwrap();
            (seen_up, store.current_user_id())
        })
    };

    store.on_auth_event(established("u1")).await.unwrap();
    common::settle().await;
    store.on_auth_event(AuthEvent::SessionEnded).await.unwrap();

    let (seen_up, seen_down) = observer.await.unwrap();
    assert_eq!(seen_up.as_deref(), Some("u1"));
    assert_eq!(seen_down, None);
}

#[tokio::test]
async fn test_ended_event_when_signed_out_clears_slot() {
    let backend = fixture_backend();
    // A record nobody restored yet.
    let slot = Arc::new(MemorySlot::with_record(r#"{"id":"u1","name":"Ana"}"#));
    let store = store_with(&backend, slot.clone());

    store.on_auth_event(AuthEvent::SessionEnded).await.unwrap();

    assert!(!store.is_authenticated());
    assert_eq!(slot.load().unwrap(), None);
}

// ─── Refresh and direct login ────────────────────────────────────

#[tokio::test]
async fn test_refresh_picks_up_profile_changes() {
    let backend = fixture_backend();
    let store = memory_store(&backend);
    store.on_auth_event(established("u1")).await.unwrap();
    let mut flag = store.subscribe_authenticated();

    let mut renamed = user("u1", "Ana Maria");
    renamed.avatar = Some("ana.png".to_string());
    backend.insert_user(renamed);
    store.refresh().await.unwrap();

    let identity = store.current_user().unwrap();
    assert_eq!(identity.name, "Ana Maria");
    assert_eq!(
        identity.avatar_url.as_deref(),
        Some("https://project.example.co/storage/v1/object/public/avatars/ana.png")
    );
    assert!(!flag.has_changed().unwrap());
}

#[tokio::test]
async fn test_refresh_failure_keeps_identity() {
    let backend = fixture_backend();
    let store = memory_store(&backend);
    store.on_auth_event(established("u1")).await.unwrap();

    backend.remove_user("u1");
    assert!(store.refresh().await.is_err());
    assert_eq!(store.current_user().unwrap().name, "Ana");
    assert!(store.is_authenticated());
}

#[tokio::test]
async fn test_refresh_when_signed_out_is_noop() {
    let backend = fixture_backend();
    let store = memory_store(&backend);

    store.refresh().await.unwrap();
    assert!(store.current_user().is_none());
    assert_eq!(backend.calls(tables::USERS), 0);
}

#[tokio::test]
async fn test_direct_login_and_logout() {
    let backend = fixture_backend();
    let slot = Arc::new(MemorySlot::new());
    let store = store_with(&backend, slot.clone());

    assert!(store.login("  ").await.is_err());
    assert!(store.login("u2").await.is_err());
    assert!(!store.is_authenticated());

    let identity = store.login("u3").await.unwrap();
    assert_eq!(identity.name, "Bea");
    assert!(store.is_authenticated());
    assert!(slot.load().unwrap().is_some());

    store.logout().await;
    assert!(!store.is_authenticated());
    assert!(store.current_user().is_none());
    assert_eq!(slot.load().unwrap(), None);
}

// ─── Credential actions through the event pump ───────────────────

#[tokio::test]
async fn test_sign_in_and_out_through_event_pump() {
    let backend = fixture_backend();
    let store = memory_store(&backend);
    let pump = store.spawn_event_pump();

    let outcome = store
        .sign_in(&Credentials::new("ana@example.com", "secret1"))
        .await;
    assert!(outcome.success);
    wait_until(store.subscribe_authenticated(), |v| *v).await;
    assert_eq!(store.current_user_id().as_deref(), Some("u1"));

    let outcome = store.sign_out().await;
    assert!(outcome.success);
    wait_until(store.subscribe_authenticated(), |v| !*v).await;
    assert!(store.current_user().is_none());

    pump.abort();
}

#[tokio::test]
async fn test_sign_in_rejected() {
    let backend = fixture_backend();
    let store = memory_store(&backend);

    let outcome = store
        .sign_in(&Credentials::new("ana@example.com", "wrong"))
        .await;
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Invalid login credentials");
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn test_pump_survives_unresolvable_event() {
    let backend = fixture_backend();
    let store = memory_store(&backend);
    let pump = store.spawn_event_pump();

    backend.emit(established("u2"));
    backend.emit(established("u3"));

    wait_until(store.subscribe_authenticated(), |v| *v).await;
    assert_eq!(store.current_user_id().as_deref(), Some("u3"));
    assert!(!pump.is_finished());
    pump.abort();
}

#[tokio::test]
async fn test_sign_up_creates_profile() {
    let backend = fixture_backend();
    let store = memory_store(&backend);

    let outcome = store
        .sign_up(&Credentials::new("new@example.com", "secret1"), "  Cleo ")
        .await;
    assert!(outcome.success, "{}", outcome.message);

    // No session until the email is confirmed.
    assert!(!store.is_authenticated());
    let created = store.login("user-1").await.unwrap();
    assert_eq!(created.name, "Cleo");
}

#[tokio::test]
async fn test_sign_up_with_auto_confirm_opens_session() {
    let backend = fixture_backend();
    backend.set_auto_confirm(true);
    let store = memory_store(&backend);
    let pump = store.spawn_event_pump();

    let outcome = store
        .sign_up(&Credentials::new("new@example.com", "secret1"), "Cleo")
        .await;
    assert!(outcome.success);

    wait_until(store.subscribe_authenticated(), |v| *v).await;
    let identity = store.current_user().unwrap();
    assert_eq!(identity.id, "user-1");
    assert_eq!(identity.name, "Cleo");
    pump.abort();
}

#[tokio::test]
async fn test_sign_up_duplicate_email() {
    let backend = fixture_backend();
    let store = memory_store(&backend);

    let outcome = store
        .sign_up(&Credentials::new("ana@example.com", "secret1"), "Ana")
        .await;
    assert!(!outcome.success);
    assert_eq!(outcome.message, "User already registered");
}

#[tokio::test]
async fn test_sign_up_profile_failure_is_reported() {
    let backend = fixture_backend();
    backend.fail_table(tables::USERS, "insert failed");
    let store = memory_store(&backend);

    let outcome = store
        .sign_up(&Credentials::new("new@example.com", "secret1"), "Cleo")
        .await;
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Something went wrong, please try again");
}

#[tokio::test]
async fn test_password_reset_always_succeeds() {
    let backend = fixture_backend();
    let store = memory_store(&backend);

    for email in ["ana@example.com", "nobody@example.com"] {
        let outcome = store.request_password_reset(email).await;
        assert!(outcome.success);
        assert_eq!(outcome.message, "Check your inbox for a reset link");
    }
}
