// ABOUTME: Core data models for the Somnus sleep tracking backend
// ABOUTME: Defines sessions, goals, reminders, statistics, profiles, and the duration calculator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! # Data Models
//!
//! Core data structures used throughout the server. All entities are scoped
//! to exactly one owning user; there is no cross-user sharing.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Round a fractional-hours value to two decimal places.
///
/// Used for session durations and statistic averages so persisted values
/// match what the API reports.
#[must_use]
pub fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Elapsed sleep duration in hours between two instants, rounded to two
/// decimal places.
///
/// Pure transform invoked on every session create/update prior to
/// persistence. The result is signed: a wake instant at or before the sleep
/// instant yields zero or a negative value, and callers that cannot accept
/// that must validate ordering before invoking.
#[must_use]
pub fn duration_hours(sleep_time: DateTime<Utc>, wake_time: DateTime<Utc>) -> f64 {
    let elapsed: Duration = wake_time - sleep_time;
    let seconds = elapsed.num_milliseconds() as f64 / 1000.0;
    round_hundredths(seconds / 3600.0)
}

/// A registered user
///
/// Authentication is out of scope; this record carries the identity and
/// notification recipient address that the rest of the system keys on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name to address the user by in outbound messages
    #[must_use]
    pub fn salutation(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

/// Extended per-user profile with sleep-related preferences (1:1 with user)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub target_sleep_hours: f64,
    pub timezone: String,
    pub notification_enabled: bool,
    pub notification_time: Option<NaiveTime>,
    pub calendar_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Default profile for a user that has not customized anything yet
    #[must_use]
    pub fn default_for(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            target_sleep_hours: 8.0,
            timezone: "UTC".to_owned(),
            notification_enabled: true,
            notification_time: None,
            calendar_enabled: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Structured remote-calendar credential for one user
///
/// Replaces an opaque serialized blob with explicit typed fields. Refresh
/// produces a new record; nothing mutates a credential in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarCredential {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl CalendarCredential {
    /// Whether the access token can still be presented to the remote service.
    ///
    /// A small margin keeps a token that expires mid-request from being
    /// treated as valid.
    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        self.expires_at
            .map_or(true, |expires| expires > now + Duration::seconds(60))
    }
}

/// Ordinal sleep quality rating, 1 (very poor) through 5 (excellent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum QualityRating {
    VeryPoor = 1,
    Poor = 2,
    Fair = 3,
    Good = 4,
    Excellent = 5,
}

impl QualityRating {
    /// Numeric value of the rating
    #[must_use]
    pub const fn value(self) -> i64 {
        self as i64
    }

    /// Parse from a stored integer value
    #[must_use]
    pub const fn from_value(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::VeryPoor),
            2 => Some(Self::Poor),
            3 => Some(Self::Fair),
            4 => Some(Self::Good),
            5 => Some(Self::Excellent),
            _ => None,
        }
    }

    /// Human-readable label, as shown in calendar events and reports
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryPoor => "Very Poor",
            Self::Poor => "Poor",
            Self::Fair => "Fair",
            Self::Good => "Good",
            Self::Excellent => "Excellent",
        }
    }
}

impl TryFrom<u8> for QualityRating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(i64::from(value))
            .ok_or_else(|| format!("quality rating must be between 1 and 5, got {value}"))
    }
}

impl From<QualityRating> for u8 {
    fn from(rating: QualityRating) -> Self {
        rating as Self
    }
}

impl Display for QualityRating {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.label())
    }
}

/// One logged sleep interval
///
/// `duration_hours` is always recomputed from the timestamp pair whenever
/// either timestamp changes; it is never set independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub sleep_time: DateTime<Utc>,
    pub wake_time: DateTime<Utc>,
    pub quality_rating: Option<QualityRating>,
    pub notes: String,
    pub duration_hours: Option<f64>,
    pub synced_to_calendar: bool,
    pub calendar_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SleepSession {
    /// Build a new session for an owner, deriving the duration
    #[must_use]
    pub fn new(
        user_id: Uuid,
        sleep_time: DateTime<Utc>,
        wake_time: DateTime<Utc>,
        quality_rating: Option<QualityRating>,
        notes: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            sleep_time,
            wake_time,
            quality_rating,
            notes,
            duration_hours: Some(duration_hours(sleep_time, wake_time)),
            synced_to_calendar: false,
            calendar_event_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Recompute the derived duration from the current timestamp pair
    pub fn recompute_duration(&mut self) {
        self.duration_hours = Some(duration_hours(self.sleep_time, self.wake_time));
    }
}

/// A user's sleep goal: target bedtime, wake time, and duration for a set
/// of weekdays. Multiple goals per user may coexist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_bedtime: NaiveTime,
    pub target_wake_time: NaiveTime,
    pub target_duration_hours: f64,
    pub days_of_week: Vec<Weekday>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reminder kinds dispatched by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
    /// Wind-down nudge before the target bedtime
    Bedtime,
    /// Morning wake-up nudge
    Wake,
    /// Prompt to log yesterday's session
    Log,
}

impl ReminderKind {
    /// Stable string form used in storage and the API
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bedtime => "bedtime",
            Self::Wake => "wake",
            Self::Log => "log",
        }
    }
}

impl FromStr for ReminderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bedtime" => Ok(Self::Bedtime),
            "wake" => Ok(Self::Wake),
            "log" => Ok(Self::Log),
            other => Err(format!("unknown reminder kind: {other}")),
        }
    }
}

impl Display for ReminderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A scheduled reminder
///
/// `last_sent` is updated only by the reminder scheduler after a confirmed
/// successful dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepReminder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: ReminderKind,
    pub reminder_time: NaiveTime,
    pub is_active: bool,
    pub message: Option<String>,
    pub last_sent: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregation granularity for statistics rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Daily,
    Weekly,
    /// Defined for forward compatibility; no current task produces it
    Monthly,
}

impl PeriodKind {
    /// Stable string form used in storage and the API
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl FromStr for PeriodKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(format!("unknown period kind: {other}")),
        }
    }
}

impl Display for PeriodKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// One aggregated statistics row
///
/// At most one row exists per (owner, anchor date, period kind); the store
/// enforces this with a real uniqueness constraint and upsert semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepStatistics {
    pub id: Uuid,
    pub user_id: Uuid,
    /// The day itself for daily rows, the ISO-week Monday for weekly rows
    pub date: NaiveDate,
    pub period: PeriodKind,
    pub total_sleep_hours: f64,
    pub average_sleep_hours: f64,
    pub average_quality: Option<f64>,
    pub sessions_count: i64,
    pub goal_achievement_rate: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
