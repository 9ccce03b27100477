// ABOUTME: Integration tests for the statistics aggregation tasks
// ABOUTME: Covers windowing, averaging, quality handling, and upsert idempotency

mod common;

use anyhow::Result;
use chrono::NaiveDate;
use common::{create_test_database, create_test_user, seed_session, utc};
use somnus_server::models::{PeriodKind, QualityRating};
use somnus_server::tasks::{calculate_daily_statistics, calculate_weekly_statistics};

// 2025-05-02 is a Friday; sessions on 2025-05-01 (Thursday) are "yesterday"
fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, 2).unwrap()
}

#[tokio::test]
async fn daily_statistics_average_and_count() -> Result<()> {
    let db = create_test_database().await?;
    let user = create_test_user(&db, "ada@example.com").await?;

    seed_session(&db, user.id, utc(2025, 5, 1, 0, 30, 0), utc(2025, 5, 1, 8, 0, 0), None).await?;
    seed_session(&db, user.id, utc(2025, 5, 1, 13, 0, 0), utc(2025, 5, 1, 21, 0, 0), None).await?;
    seed_session(&db, user.id, utc(2025, 5, 1, 22, 30, 0), utc(2025, 5, 2, 5, 0, 0), None).await?;

    // durations 7.5, 8.0, 6.5; the third starts on May 1 so it is in window
    let run = calculate_daily_statistics(&db, today()).await?;
    assert_eq!(run.written, 1);
    assert_eq!(run.anchor, NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());

    let row = db
        .get_statistics(user.id, run.anchor, PeriodKind::Daily)
        .await?
        .expect("daily row written");
    assert_eq!(row.sessions_count, 3);
    assert!((row.total_sleep_hours - 22.0).abs() < 1e-9);
    assert!((row.average_sleep_hours - 7.33).abs() < 1e-9);
    assert_eq!(row.average_quality, None);

    Ok(())
}

#[tokio::test]
async fn daily_statistics_upsert_is_idempotent() -> Result<()> {
    let db = create_test_database().await?;
    let user = create_test_user(&db, "bo@example.com").await?;

    seed_session(&db, user.id, utc(2025, 5, 1, 23, 0, 0), utc(2025, 5, 2, 7, 0, 0), None).await?;

    let first = calculate_daily_statistics(&db, today()).await?;
    let second = calculate_daily_statistics(&db, today()).await?;
    assert_eq!(first.written, 1);
    assert_eq!(second.written, 1);

    let anchor = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
    assert_eq!(db.count_statistics_rows(user.id, anchor, PeriodKind::Daily).await?, 1);

    let row = db
        .get_statistics(user.id, anchor, PeriodKind::Daily)
        .await?
        .expect("row exists");
    assert_eq!(row.sessions_count, 1);
    assert!((row.total_sleep_hours - 8.0).abs() < 1e-9);

    Ok(())
}

#[tokio::test]
async fn quality_average_covers_only_rated_sessions() -> Result<()> {
    let db = create_test_database().await?;
    let user = create_test_user(&db, "cy@example.com").await?;

    seed_session(
        &db,
        user.id,
        utc(2025, 5, 1, 1, 0, 0),
        utc(2025, 5, 1, 8, 0, 0),
        Some(QualityRating::Fair),
    )
    .await?;
    seed_session(
        &db,
        user.id,
        utc(2025, 5, 1, 14, 0, 0),
        utc(2025, 5, 1, 15, 0, 0),
        Some(QualityRating::Excellent),
    )
    .await?;
    seed_session(&db, user.id, utc(2025, 5, 1, 22, 0, 0), utc(2025, 5, 2, 6, 0, 0), None).await?;

    calculate_daily_statistics(&db, today()).await?;

    let row = db
        .get_statistics(user.id, NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(), PeriodKind::Daily)
        .await?
        .expect("row exists");
    // (3 + 5) / 2 rated sessions
    assert_eq!(row.average_quality, Some(4.0));
    assert_eq!(row.sessions_count, 3);

    Ok(())
}

#[tokio::test]
async fn empty_window_is_a_silent_no_op() -> Result<()> {
    let db = create_test_database().await?;
    let user = create_test_user(&db, "dee@example.com").await?;

    // Session today, not yesterday: outside the daily window
    seed_session(&db, user.id, utc(2025, 5, 2, 1, 0, 0), utc(2025, 5, 2, 9, 0, 0), None).await?;

    let run = calculate_daily_statistics(&db, today()).await?;
    assert_eq!(run.written, 0);

    let anchor = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
    assert_eq!(db.count_statistics_rows(user.id, anchor, PeriodKind::Daily).await?, 0);

    Ok(())
}

#[tokio::test]
async fn weekly_statistics_anchor_on_monday() -> Result<()> {
    let db = create_test_database().await?;
    let user = create_test_user(&db, "eli@example.com").await?;

    // Week of Monday 2025-04-28: sessions Tuesday and Thursday
    seed_session(&db, user.id, utc(2025, 4, 29, 23, 0, 0), utc(2025, 4, 30, 6, 0, 0), None).await?;
    seed_session(&db, user.id, utc(2025, 5, 1, 22, 0, 0), utc(2025, 5, 2, 7, 0, 0), None).await?;
    // Previous week: excluded from this window
    seed_session(&db, user.id, utc(2025, 4, 25, 23, 0, 0), utc(2025, 4, 26, 7, 0, 0), None).await?;

    let run = calculate_weekly_statistics(&db, today()).await?;
    let monday = NaiveDate::from_ymd_opt(2025, 4, 28).unwrap();
    assert_eq!(run.anchor, monday);
    assert_eq!(run.written, 1);

    let row = db
        .get_statistics(user.id, monday, PeriodKind::Weekly)
        .await?
        .expect("weekly row written");
    assert_eq!(row.sessions_count, 2);
    assert!((row.total_sleep_hours - 16.0).abs() < 1e-9);
    assert!((row.average_sleep_hours - 8.0).abs() < 1e-9);

    Ok(())
}

#[tokio::test]
async fn statistics_cover_every_owner_with_sessions() -> Result<()> {
    let db = create_test_database().await?;
    let first = create_test_user(&db, "one@example.com").await?;
    let second = create_test_user(&db, "two@example.com").await?;
    let idle = create_test_user(&db, "idle@example.com").await?;

    seed_session(&db, first.id, utc(2025, 5, 1, 23, 0, 0), utc(2025, 5, 2, 6, 0, 0), None).await?;
    seed_session(&db, second.id, utc(2025, 5, 1, 22, 0, 0), utc(2025, 5, 2, 7, 0, 0), None).await?;

    let run = calculate_daily_statistics(&db, today()).await?;
    assert_eq!(run.written, 2);

    let anchor = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
    assert!(db.get_statistics(first.id, anchor, PeriodKind::Daily).await?.is_some());
    assert!(db.get_statistics(second.id, anchor, PeriodKind::Daily).await?.is_some());
    assert!(db.get_statistics(idle.id, anchor, PeriodKind::Daily).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn rerun_after_edit_overwrites_the_same_row() -> Result<()> {
    let db = create_test_database().await?;
    let user = create_test_user(&db, "fay@example.com").await?;

    let mut session =
        seed_session(&db, user.id, utc(2025, 5, 1, 23, 0, 0), utc(2025, 5, 2, 6, 0, 0), None)
            .await?;
    calculate_daily_statistics(&db, today()).await?;

    // Edit the session and re-run; the same row must reflect the new data
    session.wake_time = utc(2025, 5, 2, 8, 0, 0);
    session.recompute_duration();
    db.update_session(&session).await?;
    calculate_daily_statistics(&db, today()).await?;

    let anchor = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
    assert_eq!(db.count_statistics_rows(user.id, anchor, PeriodKind::Daily).await?, 1);
    let row = db
        .get_statistics(user.id, anchor, PeriodKind::Daily)
        .await?
        .expect("row exists");
    assert!((row.total_sleep_hours - 9.0).abs() < 1e-9);

    Ok(())
}
