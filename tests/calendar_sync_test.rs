// ABOUTME: Integration tests for the calendar sync adapter
// ABOUTME: Covers idempotent create/update mapping, credential refresh, and failure modes

mod common;

use anyhow::Result;
use chrono::{Duration, Utc};
use common::{
    create_test_database, create_test_user, enable_calendar, seed_credential, seed_session, utc,
    MockCalendar,
};
use somnus_server::calendar::sync::{SyncError, SyncOutcome};
use somnus_server::tasks::sync_sleep_to_calendar;
use std::sync::atomic::Ordering;
use uuid::Uuid;

#[tokio::test]
async fn sync_twice_never_creates_a_second_event() -> Result<()> {
    let db = create_test_database().await?;
    let user = create_test_user(&db, "ada@example.com").await?;
    enable_calendar(&db, user.id).await?;
    seed_credential(&db, user.id, Some(Utc::now() + Duration::hours(1))).await?;

    let session =
        seed_session(&db, user.id, utc(2025, 5, 1, 22, 0, 0), utc(2025, 5, 2, 6, 0, 0), None)
            .await?;

    let calendar = MockCalendar::new();

    let event_id = match sync_sleep_to_calendar(&db, &calendar, session.id).await? {
        SyncOutcome::Created { event_id } => event_id,
        other => panic!("expected a created event, got {other:?}"),
    };
    assert_eq!(calendar.create_calls.load(Ordering::SeqCst), 1);

    let stored = db.get_session(session.id).await?.expect("session exists");
    assert!(stored.synced_to_calendar);
    assert_eq!(stored.calendar_event_id.as_deref(), Some(event_id.as_str()));

    // Second sync updates the same remote event in place
    let second = sync_sleep_to_calendar(&db, &calendar, session.id).await?;
    assert_eq!(
        second,
        SyncOutcome::Updated {
            event_id: event_id.clone()
        }
    );
    assert_eq!(calendar.create_calls.load(Ordering::SeqCst), 1);
    assert_eq!(calendar.update_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        calendar.updated_ids.lock().unwrap().as_slice(),
        &[event_id]
    );

    Ok(())
}

#[tokio::test]
async fn vanished_session_is_a_descriptive_no_op() -> Result<()> {
    let db = create_test_database().await?;
    let calendar = MockCalendar::new();

    let missing = Uuid::new_v4();
    let outcome = sync_sleep_to_calendar(&db, &calendar, missing).await?;
    assert_eq!(outcome, SyncOutcome::SessionNotFound(missing));
    assert_eq!(calendar.create_calls.load(Ordering::SeqCst), 0);

    Ok(())
}

#[tokio::test]
async fn disabled_calendar_skips_sync() -> Result<()> {
    let db = create_test_database().await?;
    let user = create_test_user(&db, "bo@example.com").await?;
    seed_credential(&db, user.id, Some(Utc::now() + Duration::hours(1))).await?;

    let session =
        seed_session(&db, user.id, utc(2025, 5, 1, 22, 0, 0), utc(2025, 5, 2, 6, 0, 0), None)
            .await?;

    let calendar = MockCalendar::new();
    let outcome = sync_sleep_to_calendar(&db, &calendar, session.id).await?;

    assert_eq!(outcome, SyncOutcome::SkippedDisabled);
    assert_eq!(calendar.create_calls.load(Ordering::SeqCst), 0);

    Ok(())
}

#[tokio::test]
async fn missing_credential_is_an_unauthenticated_failure() -> Result<()> {
    let db = create_test_database().await?;
    let user = create_test_user(&db, "cy@example.com").await?;
    enable_calendar(&db, user.id).await?;

    let session =
        seed_session(&db, user.id, utc(2025, 5, 1, 22, 0, 0), utc(2025, 5, 2, 6, 0, 0), None)
            .await?;

    let calendar = MockCalendar::new();
    let error = sync_sleep_to_calendar(&db, &calendar, session.id)
        .await
        .expect_err("sync must fail without a credential");
    assert!(matches!(error, SyncError::Unauthenticated { .. }));

    // Local state untouched
    let stored = db.get_session(session.id).await?.expect("session exists");
    assert!(!stored.synced_to_calendar);
    assert_eq!(stored.calendar_event_id, None);

    Ok(())
}

#[tokio::test]
async fn remote_failure_leaves_session_unsynced_and_is_retryable() -> Result<()> {
    let db = create_test_database().await?;
    let user = create_test_user(&db, "dee@example.com").await?;
    enable_calendar(&db, user.id).await?;
    seed_credential(&db, user.id, Some(Utc::now() + Duration::hours(1))).await?;

    let session =
        seed_session(&db, user.id, utc(2025, 5, 1, 22, 0, 0), utc(2025, 5, 2, 6, 0, 0), None)
            .await?;

    let calendar = MockCalendar::new();
    calendar.fail_remote.store(true, Ordering::SeqCst);

    let error = sync_sleep_to_calendar(&db, &calendar, session.id)
        .await
        .expect_err("sync must fail while the remote is down");
    assert!(matches!(error, SyncError::Remote(_)));

    let stored = db.get_session(session.id).await?.expect("session exists");
    assert!(!stored.synced_to_calendar);

    // Once the remote recovers, the same invocation succeeds
    calendar.fail_remote.store(false, Ordering::SeqCst);
    let outcome = sync_sleep_to_calendar(&db, &calendar, session.id).await?;
    assert!(matches!(outcome, SyncOutcome::Created { .. }));

    Ok(())
}

#[tokio::test]
async fn expired_credential_is_refreshed_and_persisted() -> Result<()> {
    let db = create_test_database().await?;
    let user = create_test_user(&db, "eli@example.com").await?;
    enable_calendar(&db, user.id).await?;
    seed_credential(&db, user.id, Some(Utc::now() - Duration::hours(1))).await?;

    let session =
        seed_session(&db, user.id, utc(2025, 5, 1, 22, 0, 0), utc(2025, 5, 2, 6, 0, 0), None)
            .await?;

    let calendar = MockCalendar::new();
    let outcome = sync_sleep_to_calendar(&db, &calendar, session.id).await?;

    assert!(matches!(outcome, SyncOutcome::Created { .. }));
    assert_eq!(calendar.refresh_calls.load(Ordering::SeqCst), 1);

    // The refreshed record replaced the stored one
    let credential = db
        .get_calendar_credential(user.id)
        .await?
        .expect("credential still on file");
    assert_eq!(credential.access_token, "refreshed-access-token");
    assert!(credential.is_valid(Utc::now()));

    Ok(())
}

#[tokio::test]
async fn failed_refresh_requires_reauthorization() -> Result<()> {
    let db = create_test_database().await?;
    let user = create_test_user(&db, "fay@example.com").await?;
    enable_calendar(&db, user.id).await?;
    seed_credential(&db, user.id, Some(Utc::now() - Duration::hours(1))).await?;

    let session =
        seed_session(&db, user.id, utc(2025, 5, 1, 22, 0, 0), utc(2025, 5, 2, 6, 0, 0), None)
            .await?;

    let calendar = MockCalendar::new();
    calendar.fail_refresh.store(true, Ordering::SeqCst);

    let error = sync_sleep_to_calendar(&db, &calendar, session.id)
        .await
        .expect_err("sync must fail when refresh is rejected");
    assert!(matches!(error, SyncError::Unauthenticated { .. }));

    // No remote event was attempted and the session is untouched
    assert_eq!(calendar.create_calls.load(Ordering::SeqCst), 0);
    let stored = db.get_session(session.id).await?.expect("session exists");
    assert!(!stored.synced_to_calendar);

    Ok(())
}

#[tokio::test]
async fn edited_session_updates_the_same_event() -> Result<()> {
    let db = create_test_database().await?;
    let user = create_test_user(&db, "gil@example.com").await?;
    enable_calendar(&db, user.id).await?;
    seed_credential(&db, user.id, Some(Utc::now() + Duration::hours(1))).await?;

    let mut session =
        seed_session(&db, user.id, utc(2025, 5, 1, 22, 0, 0), utc(2025, 5, 2, 6, 0, 0), None)
            .await?;

    let calendar = MockCalendar::new();
    sync_sleep_to_calendar(&db, &calendar, session.id).await?;

    session.wake_time = utc(2025, 5, 2, 7, 30, 0);
    session.recompute_duration();
    db.update_session(&session).await?;

    let outcome = sync_sleep_to_calendar(&db, &calendar, session.id).await?;
    assert!(matches!(outcome, SyncOutcome::Updated { .. }));
    assert_eq!(calendar.create_calls.load(Ordering::SeqCst), 1);
    assert_eq!(calendar.update_calls.load(Ordering::SeqCst), 1);

    Ok(())
}
