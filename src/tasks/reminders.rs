// ABOUTME: Reminder dispatch tasks matching active reminders against the tick's wall clock
// ABOUTME: Updates last-sent only after a confirmed successful dispatch

//! # Reminder Dispatch
//!
//! Once per minute-resolution tick, each kind's task selects the active
//! reminders whose configured time-of-day matches the tick's hour and
//! minute and dispatches a notification when the owner has notifications
//! enabled. `last_sent` advances only on confirmed success; a failed
//! dispatch leaves the reminder a candidate for the next qualifying tick.
//! There is no in-process retry loop: the periodic trigger's recurrence
//! substitutes for it.

use crate::database::Database;
use crate::models::{ReminderKind, SleepReminder, User};
use crate::notifications::{messages, NotificationSender, OutboundMessage};
use anyhow::Result;
use chrono::{DateTime, Duration, Timelike, Utc};
use std::fmt;
use tracing::{info, warn};

/// Result of one dispatch run for one reminder kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRun {
    pub kind: ReminderKind,
    /// Reminders whose time matched the tick
    pub due: usize,
    /// Dispatches confirmed by the transport
    pub sent: usize,
}

impl fmt::Display for ReminderRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sent {} of {} due {} reminder(s)",
            self.sent, self.due, self.kind
        )
    }
}

fn build_message(
    kind: ReminderKind,
    user: &User,
    reminder: &SleepReminder,
) -> OutboundMessage {
    let custom = reminder.message.as_deref();
    match kind {
        ReminderKind::Bedtime => {
            messages::bedtime_reminder(&user.email, user.salutation(), reminder.reminder_time, custom)
        }
        ReminderKind::Wake => {
            messages::wake_reminder(&user.email, user.salutation(), reminder.reminder_time, custom)
        }
        ReminderKind::Log => messages::log_reminder(&user.email, user.salutation(), custom),
    }
}

async fn dispatch_due(
    database: &Database,
    notifier: &dyn NotificationSender,
    kind: ReminderKind,
    tick: DateTime<Utc>,
) -> Result<ReminderRun> {
    let time = tick.time();
    let due = database
        .due_reminders(kind, time.hour(), time.minute())
        .await?;

    let mut sent = 0;
    let due_count = due.len();

    for reminder in due {
        let Some(user) = database.get_user(reminder.user_id).await? else {
            warn!("Reminder {} references a missing user", reminder.id);
            continue;
        };

        let profile = database.get_or_create_profile(user.id).await?;
        if !profile.notification_enabled {
            continue;
        }

        // The log reminder has a secondary due-check: skip owners who
        // already logged a session for yesterday.
        if kind == ReminderKind::Log {
            let yesterday = tick.date_naive() - Duration::days(1);
            if database.has_session_on(user.id, yesterday).await? {
                continue;
            }
        }

        let message = build_message(kind, &user, &reminder);
        match notifier.send(&message).await {
            Ok(count) if count > 0 => {
                database.mark_reminder_sent(reminder.id, tick).await?;
                sent += 1;
            }
            Ok(_) => {
                warn!(
                    "{} reminder for {} accepted zero messages; leaving last_sent unchanged",
                    kind, user.email
                );
            }
            Err(e) => {
                warn!(
                    "{} reminder dispatch to {} failed: {e}; leaving last_sent unchanged",
                    kind, user.email
                );
            }
        }
    }

    let run = ReminderRun {
        kind,
        due: due_count,
        sent,
    };
    info!("{run}");
    Ok(run)
}

/// Dispatch bedtime reminders due at this tick
///
/// # Errors
///
/// Returns an error only on store failure; dispatch failures are absorbed
/// into the run report and the operational log.
pub async fn send_bedtime_reminders(
    database: &Database,
    notifier: &dyn NotificationSender,
    tick: DateTime<Utc>,
) -> Result<ReminderRun> {
    dispatch_due(database, notifier, ReminderKind::Bedtime, tick).await
}

/// Dispatch wake reminders due at this tick
///
/// # Errors
///
/// Returns an error only on store failure.
pub async fn send_wake_reminders(
    database: &Database,
    notifier: &dyn NotificationSender,
    tick: DateTime<Utc>,
) -> Result<ReminderRun> {
    dispatch_due(database, notifier, ReminderKind::Wake, tick).await
}

/// Dispatch log reminders due at this tick, skipping owners who already
/// logged a session for yesterday
///
/// # Errors
///
/// Returns an error only on store failure.
pub async fn send_log_reminders(
    database: &Database,
    notifier: &dyn NotificationSender,
    tick: DateTime<Utc>,
) -> Result<ReminderRun> {
    dispatch_due(database, notifier, ReminderKind::Log, tick).await
}
