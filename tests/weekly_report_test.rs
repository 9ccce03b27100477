// ABOUTME: Integration tests for the weekly report task
// ABOUTME: Covers last-week anchoring, opt-out handling, and dispatch failure absorption

mod common;

use anyhow::Result;
use chrono::NaiveDate;
use common::{create_test_database, create_test_user, MockMailer};
use somnus_server::database::{Database, StatisticsUpsert};
use somnus_server::models::PeriodKind;
use somnus_server::tasks::send_weekly_reports;
use uuid::Uuid;

async fn seed_weekly_row(db: &Database, user_id: Uuid, monday: NaiveDate) -> Result<()> {
    db.upsert_statistics(&StatisticsUpsert {
        user_id,
        date: monday,
        period: PeriodKind::Weekly,
        total_sleep_hours: 44.0,
        average_sleep_hours: 7.33,
        average_quality: Some(4.0),
        sessions_count: 6,
        goal_achievement_rate: None,
    })
    .await?;
    Ok(())
}

#[tokio::test]
async fn reports_cover_last_weeks_monday_anchor() -> Result<()> {
    let db = create_test_database().await?;
    let user = create_test_user(&db, "ada@example.com").await?;

    // Reporting on Friday 2025-05-02; last week's Monday is 2025-04-21
    let last_monday = NaiveDate::from_ymd_opt(2025, 4, 21).unwrap();
    seed_weekly_row(&db, user.id, last_monday).await?;

    // A row for the current week must not trigger a report
    let this_monday = NaiveDate::from_ymd_opt(2025, 4, 28).unwrap();
    let bystander = create_test_user(&db, "bystander@example.com").await?;
    seed_weekly_row(&db, bystander.id, this_monday).await?;

    let mailer = MockMailer::new();
    let today = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
    let run = send_weekly_reports(&db, &mailer, today).await?;

    assert_eq!(run.week_of, last_monday);
    assert_eq!(run.eligible, 1);
    assert_eq!(run.sent, 1);
    assert_eq!(mailer.recipients(), vec!["ada@example.com".to_owned()]);

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent[0].subject, "Your Weekly Sleep Report");
    assert!(sent[0].plain_body.contains("7.3h"));

    Ok(())
}

#[tokio::test]
async fn opted_out_users_receive_no_report() -> Result<()> {
    let db = create_test_database().await?;
    let user = create_test_user(&db, "bo@example.com").await?;

    let mut profile = db.get_or_create_profile(user.id).await?;
    profile.notification_enabled = false;
    db.upsert_profile(&profile).await?;

    let last_monday = NaiveDate::from_ymd_opt(2025, 4, 21).unwrap();
    seed_weekly_row(&db, user.id, last_monday).await?;

    let mailer = MockMailer::new();
    let today = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
    let run = send_weekly_reports(&db, &mailer, today).await?;

    assert_eq!(run.eligible, 1);
    assert_eq!(run.sent, 0);
    assert_eq!(mailer.sent_count(), 0);

    Ok(())
}

#[tokio::test]
async fn dispatch_failure_is_absorbed_into_the_run_report() -> Result<()> {
    let db = create_test_database().await?;
    let user = create_test_user(&db, "cy@example.com").await?;

    let last_monday = NaiveDate::from_ymd_opt(2025, 4, 21).unwrap();
    seed_weekly_row(&db, user.id, last_monday).await?;

    let mailer = MockMailer::failing();
    let today = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
    let run = send_weekly_reports(&db, &mailer, today).await?;

    assert_eq!(run.eligible, 1);
    assert_eq!(run.sent, 0);

    Ok(())
}
