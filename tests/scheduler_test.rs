// ABOUTME: Integration tests for the periodic driver tick
// ABOUTME: Drives run_tick with a fixed clock against mock collaborators

mod common;

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime, Utc};
use common::{create_test_database, create_test_user, seed_session, utc, MockCalendar, MockMailer};
use somnus_server::calendar::google::GoogleCalendarConfig;
use somnus_server::config::ServerConfig;
use somnus_server::models::{PeriodKind, ReminderKind, SleepReminder};
use somnus_server::notifications::mailer::MailerConfig;
use somnus_server::server::ServerResources;
use somnus_server::tasks::scheduler::{run_tick, ScheduleConfig};
use std::sync::Arc;
use uuid::Uuid;

fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        database_url: "sqlite::memory:".into(),
        google: GoogleCalendarConfig::default(),
        mailer: MailerConfig::default(),
        schedule: ScheduleConfig::default(),
    }
}

async fn test_resources() -> Result<(Arc<ServerResources>, Arc<MockMailer>)> {
    let db = create_test_database().await?;
    let mailer = Arc::new(MockMailer::new());
    let resources = Arc::new(ServerResources::new(
        db,
        Arc::new(MockCalendar::new()),
        mailer.clone(),
        test_config(),
    ));
    Ok((resources, mailer))
}

#[tokio::test]
async fn tick_dispatches_due_reminders() -> Result<()> {
    let (resources, mailer) = test_resources().await?;
    let db = &resources.database;
    let user = create_test_user(db, "ada@example.com").await?;

    let now = Utc::now();
    db.create_reminder(&SleepReminder {
        id: Uuid::new_v4(),
        user_id: user.id,
        kind: ReminderKind::Bedtime,
        reminder_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
        is_active: true,
        message: None,
        last_sent: None,
        created_at: now,
        updated_at: now,
    })
    .await?;

    run_tick(&resources, utc(2025, 5, 1, 21, 59, 0)).await;
    assert_eq!(mailer.sent_count(), 0);

    run_tick(&resources, utc(2025, 5, 1, 22, 0, 0)).await;
    assert_eq!(mailer.sent_count(), 1);

    Ok(())
}

#[tokio::test]
async fn daily_statistics_fire_at_the_configured_hour() -> Result<()> {
    let (resources, _mailer) = test_resources().await?;
    let db = &resources.database;
    let user = create_test_user(db, "bo@example.com").await?;

    // Session on May 1; the 02:00 tick on May 2 aggregates it
    seed_session(db, user.id, utc(2025, 5, 1, 23, 0, 0), utc(2025, 5, 2, 7, 0, 0), None).await?;

    // Wrong hour: nothing aggregated
    run_tick(&resources, utc(2025, 5, 2, 1, 0, 0)).await;
    let anchor = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
    assert!(db.get_statistics(user.id, anchor, PeriodKind::Daily).await?.is_none());

    // Configured hour, minute zero: the daily row appears
    run_tick(&resources, utc(2025, 5, 2, 2, 0, 0)).await;
    assert!(db.get_statistics(user.id, anchor, PeriodKind::Daily).await?.is_some());

    // Same hour but a non-zero minute must not re-fire hourly tasks
    run_tick(&resources, utc(2025, 5, 2, 2, 30, 0)).await;
    assert_eq!(db.count_statistics_rows(user.id, anchor, PeriodKind::Daily).await?, 1);

    Ok(())
}

#[tokio::test]
async fn weekly_tasks_fire_only_on_monday() -> Result<()> {
    let (resources, _mailer) = test_resources().await?;
    let db = &resources.database;
    let user = create_test_user(db, "cy@example.com").await?;

    // Session in the week of Monday 2025-05-05
    seed_session(db, user.id, utc(2025, 5, 5, 22, 0, 0), utc(2025, 5, 6, 6, 0, 0), None).await?;

    let monday_anchor = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();

    // Tuesday at the weekly hour: nothing
    run_tick(&resources, utc(2025, 5, 6, 3, 0, 0)).await;
    assert!(db
        .get_statistics(user.id, monday_anchor, PeriodKind::Weekly)
        .await?
        .is_none());

    // Monday at the weekly hour: the weekly row appears
    run_tick(&resources, utc(2025, 5, 5, 3, 0, 0)).await;
    assert!(db
        .get_statistics(user.id, monday_anchor, PeriodKind::Weekly)
        .await?
        .is_some());

    Ok(())
}
