// ABOUTME: Periodic driver running reminder and statistics tasks on a minute tick
// ABOUTME: Stands in for an external cron scheduler; every task it fires is idempotent

//! # Periodic Driver
//!
//! A minute-resolution loop that re-evaluates due reminders on every tick
//! and fires the aggregation and report tasks at their configured hours.
//! Tasks run to completion or failure; failures are logged and the next
//! tick re-evaluates from the store, which is the only shared state.

use crate::config::env_var_or;
use crate::server::ServerResources;
use crate::tasks::{
    calculate_daily_statistics, calculate_weekly_statistics, send_bedtime_reminders,
    send_log_reminders, send_wake_reminders, send_weekly_reports,
};
use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use std::fmt;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::error;

/// Driver schedule configuration
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Seconds between ticks; reminders match on minute resolution
    pub tick_seconds: u64,
    /// Hour of day (UTC) to compute yesterday's daily statistics
    pub daily_statistics_hour: u32,
    /// Hour of day (UTC) on Mondays to compute the running weekly statistics
    pub weekly_statistics_hour: u32,
    /// Hour of day (UTC) on Mondays to mail last week's reports
    pub weekly_report_hour: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            tick_seconds: 60,
            daily_statistics_hour: 2,
            weekly_statistics_hour: 3,
            weekly_report_hour: 8,
        }
    }
}

impl ScheduleConfig {
    /// Load the schedule from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tick_seconds: env_var_or("SCHEDULER_TICK_SECONDS", defaults.tick_seconds),
            daily_statistics_hour: env_var_or("DAILY_STATS_HOUR", defaults.daily_statistics_hour),
            weekly_statistics_hour: env_var_or(
                "WEEKLY_STATS_HOUR",
                defaults.weekly_statistics_hour,
            ),
            weekly_report_hour: env_var_or("WEEKLY_REPORT_HOUR", defaults.weekly_report_hour),
        }
    }
}

fn log_failure<T, E: fmt::Display>(label: &str, result: &Result<T, E>) {
    if let Err(e) = result {
        error!("Scheduled task {label} failed: {e}");
    }
}

/// Run every task due at one tick instant
///
/// Exposed separately from the loop so tests can drive ticks with a fixed
/// clock.
pub async fn run_tick(resources: &ServerResources, now: DateTime<Utc>) {
    let database = resources.database.as_ref();
    let notifier = resources.notifier.as_ref();

    log_failure(
        "send_bedtime_reminders",
        &send_bedtime_reminders(database, notifier, now).await,
    );
    log_failure(
        "send_wake_reminders",
        &send_wake_reminders(database, notifier, now).await,
    );
    log_failure(
        "send_log_reminders",
        &send_log_reminders(database, notifier, now).await,
    );

    // Hour-scale tasks fire on the tick that lands in minute zero.
    if now.minute() != 0 {
        return;
    }

    let schedule = &resources.config.schedule;
    let today = now.date_naive();

    if now.hour() == schedule.daily_statistics_hour {
        log_failure(
            "calculate_daily_statistics",
            &calculate_daily_statistics(database, today).await,
        );
    }

    if now.weekday() == Weekday::Mon {
        if now.hour() == schedule.weekly_statistics_hour {
            log_failure(
                "calculate_weekly_statistics",
                &calculate_weekly_statistics(database, today).await,
            );
        }
        if now.hour() == schedule.weekly_report_hour {
            log_failure(
                "send_weekly_reports",
                &send_weekly_reports(database, notifier, today).await,
            );
        }
    }
}

/// Spawn the periodic driver
///
/// The returned handle is held by the binary for the life of the process;
/// there are no cancellation semantics beyond process shutdown.
pub fn start(resources: Arc<ServerResources>) -> tokio::task::JoinHandle<()> {
    let tick = resources.config.schedule.tick_seconds.max(1);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(tick));

        loop {
            interval.tick().await;
            run_tick(&resources, Utc::now()).await;
        }
    })
}
