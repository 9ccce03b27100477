// ABOUTME: Statistics aggregation tasks producing per-user daily and weekly summary rows
// ABOUTME: Pure windowed aggregation feeding the idempotent statistics upsert

//! # Statistics Aggregation
//!
//! For a given owner and time window, collect the sessions whose
//! sleep-start falls within the window and upsert one summary row keyed by
//! `(owner, anchor date, period kind)`. An empty window is a normal no-op.
//! Re-running a task for the same day overwrites the same rows with the
//! same values, so a transient mid-run failure recovers on the next tick.

use crate::database::{Database, StatisticsUpsert};
use crate::models::{round_hundredths, PeriodKind, QualityRating, SleepSession};
use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use std::fmt;
use tracing::info;

/// Computed metrics for one owner and window
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub total_hours: f64,
    pub average_hours: f64,
    pub average_quality: Option<f64>,
    pub sessions_count: i64,
}

/// Result of one aggregation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsRun {
    pub period: PeriodKind,
    pub anchor: NaiveDate,
    /// Owners whose summary row was written this run
    pub written: usize,
}

impl fmt::Display for StatsRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wrote {} {} statistics row(s) anchored at {}",
            self.written, self.period, self.anchor
        )
    }
}

/// Aggregate a window of sessions into summary metrics
///
/// Returns `None` for an empty selection: no row is produced for that
/// owner and window. A session with no recorded duration contributes zero
/// hours but still counts toward the session count. The quality average
/// covers only rated sessions and is absent when none are rated.
#[must_use]
pub fn summarize_sessions(sessions: &[SleepSession]) -> Option<SessionSummary> {
    if sessions.is_empty() {
        return None;
    }

    let total: f64 = sessions
        .iter()
        .map(|s| s.duration_hours.unwrap_or(0.0))
        .sum();
    let count = sessions.len();
    let average = total / count as f64;

    let ratings: Vec<i64> = sessions
        .iter()
        .filter_map(|s| s.quality_rating.map(QualityRating::value))
        .collect();
    let average_quality = if ratings.is_empty() {
        None
    } else {
        Some(round_hundredths(
            ratings.iter().sum::<i64>() as f64 / ratings.len() as f64,
        ))
    };

    Some(SessionSummary {
        total_hours: round_hundredths(total),
        average_hours: round_hundredths(average),
        average_quality,
        sessions_count: count as i64,
    })
}

/// The Monday of the ISO week containing `date`, regardless of locale
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// The Monday of the previous calendar week, used for weekly reporting
#[must_use]
pub fn previous_week_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(i64::from(today.weekday().num_days_from_monday()) + 7)
}

/// UTC midnight opening the calendar day `date`
#[must_use]
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

async fn aggregate_window(
    database: &Database,
    period: PeriodKind,
    anchor: NaiveDate,
    window_days: i64,
) -> Result<StatsRun> {
    let start = day_start(anchor);
    let end = start + Duration::days(window_days);

    let owners = database.users_with_sessions_between(start, end).await?;

    let mut written = 0;
    for user_id in owners {
        let sessions = database.sessions_in_window(user_id, start, end).await?;
        let Some(summary) = summarize_sessions(&sessions) else {
            continue;
        };

        database
            .upsert_statistics(&StatisticsUpsert {
                user_id,
                date: anchor,
                period,
                total_sleep_hours: summary.total_hours,
                average_sleep_hours: summary.average_hours,
                average_quality: summary.average_quality,
                sessions_count: summary.sessions_count,
                goal_achievement_rate: None,
            })
            .await?;
        written += 1;
    }

    let run = StatsRun {
        period,
        anchor,
        written,
    };
    info!("{run}");
    Ok(run)
}

/// Compute yesterday's daily statistics for every owner with sessions
///
/// # Errors
///
/// Returns an error only on store failure; a window with no sessions is a
/// normal no-op.
pub async fn calculate_daily_statistics(database: &Database, today: NaiveDate) -> Result<StatsRun> {
    let yesterday = today - Duration::days(1);
    aggregate_window(database, PeriodKind::Daily, yesterday, 1).await
}

/// Compute this week's statistics, anchored at the ISO-week Monday
///
/// # Errors
///
/// Returns an error only on store failure.
pub async fn calculate_weekly_statistics(
    database: &Database,
    today: NaiveDate,
) -> Result<StatsRun> {
    let monday = week_start(today);
    aggregate_window(database, PeriodKind::Weekly, monday, 7).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn session_with(duration: Option<f64>, quality: Option<QualityRating>) -> SleepSession {
        let sleep = Utc.with_ymd_and_hms(2025, 5, 1, 22, 0, 0).unwrap();
        let mut session =
            SleepSession::new(Uuid::new_v4(), sleep, sleep + Duration::hours(8), quality, String::new());
        session.duration_hours = duration;
        session
    }

    #[test]
    fn empty_window_produces_no_summary() {
        assert_eq!(summarize_sessions(&[]), None);
    }

    #[test]
    fn averages_round_to_two_decimals() {
        let sessions = vec![
            session_with(Some(7.5), None),
            session_with(Some(8.0), None),
            session_with(Some(6.5), None),
        ];
        let summary = summarize_sessions(&sessions).unwrap();
        assert_eq!(summary.sessions_count, 3);
        assert!((summary.total_hours - 22.0).abs() < f64::EPSILON);
        assert!((summary.average_hours - 7.33).abs() < f64::EPSILON);
        assert_eq!(summary.average_quality, None);
    }

    #[test]
    fn quality_average_covers_only_rated_sessions() {
        let sessions = vec![
            session_with(Some(7.0), Some(QualityRating::Fair)),
            session_with(Some(8.0), None),
            session_with(Some(6.0), Some(QualityRating::Excellent)),
        ];
        let summary = summarize_sessions(&sessions).unwrap();
        assert_eq!(summary.average_quality, Some(4.0));
    }

    #[test]
    fn missing_duration_counts_as_zero_hours() {
        let sessions = vec![session_with(None, None), session_with(Some(6.0), None)];
        let summary = summarize_sessions(&sessions).unwrap();
        assert!((summary.total_hours - 6.0).abs() < f64::EPSILON);
        assert!((summary.average_hours - 3.0).abs() < f64::EPSILON);
        assert_eq!(summary.sessions_count, 2);
    }

    #[test]
    fn week_anchors_on_monday() {
        // 2025-05-01 is a Thursday
        let thursday = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        assert_eq!(week_start(thursday), NaiveDate::from_ymd_opt(2025, 4, 28).unwrap());

        let monday = NaiveDate::from_ymd_opt(2025, 4, 28).unwrap();
        assert_eq!(week_start(monday), monday);

        let sunday = NaiveDate::from_ymd_opt(2025, 5, 4).unwrap();
        assert_eq!(week_start(sunday), NaiveDate::from_ymd_opt(2025, 4, 28).unwrap());
    }

    #[test]
    fn previous_week_anchors_one_monday_back() {
        let thursday = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        assert_eq!(
            previous_week_start(thursday),
            NaiveDate::from_ymd_opt(2025, 4, 21).unwrap()
        );
    }
}
