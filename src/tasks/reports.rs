// ABOUTME: Weekly report task mailing last week's statistics to opted-in users
// ABOUTME: Reads the weekly rows anchored at the previous Monday

use super::statistics::previous_week_start;
use crate::database::Database;
use crate::models::PeriodKind;
use crate::notifications::messages::{self, WeeklyReportStats};
use crate::notifications::NotificationSender;
use anyhow::Result;
use chrono::NaiveDate;
use std::fmt;
use tracing::{info, warn};

/// Result of one weekly report run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRun {
    /// Monday anchoring the reported week
    pub week_of: NaiveDate,
    /// Weekly statistics rows found for that anchor
    pub eligible: usize,
    /// Reports confirmed by the transport
    pub sent: usize,
}

impl fmt::Display for ReportRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sent {} of {} weekly report(s) for week of {}",
            self.sent, self.eligible, self.week_of
        )
    }
}

/// Mail last week's report to every opted-in owner with a weekly row
///
/// Reads the statistics rows anchored at the previous calendar week's
/// Monday, so `calculate_weekly_statistics` must have run during that week
/// for a user to receive a report.
///
/// # Errors
///
/// Returns an error only on store failure; dispatch failures are absorbed
/// into the run report and the operational log.
pub async fn send_weekly_reports(
    database: &Database,
    notifier: &dyn NotificationSender,
    today: NaiveDate,
) -> Result<ReportRun> {
    let week_of = previous_week_start(today);
    let stats = database
        .statistics_for_date(week_of, PeriodKind::Weekly)
        .await?;

    let eligible = stats.len();
    let mut sent = 0;

    for stat in stats {
        let Some(user) = database.get_user(stat.user_id).await? else {
            warn!("Weekly statistics row {} references a missing user", stat.id);
            continue;
        };

        let profile = database.get_or_create_profile(user.id).await?;
        if !profile.notification_enabled {
            continue;
        }

        let message = messages::weekly_report(
            &user.email,
            user.salutation(),
            &WeeklyReportStats {
                average_hours: stat.average_sleep_hours,
                sessions_count: stat.sessions_count,
                average_quality: stat.average_quality.unwrap_or(0.0),
                goal_achievement: stat.goal_achievement_rate.unwrap_or(0.0),
            },
        );

        match notifier.send(&message).await {
            Ok(count) if count > 0 => sent += 1,
            Ok(_) => warn!("Weekly report to {} accepted zero messages", user.email),
            Err(e) => warn!("Weekly report dispatch to {} failed: {e}", user.email),
        }
    }

    let run = ReportRun {
        week_of,
        eligible,
        sent,
    };
    info!("{run}");
    Ok(run)
}
