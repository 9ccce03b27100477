// ABOUTME: Background task layer for reminders, statistics, reports, and calendar sync
// ABOUTME: Every task is idempotent, safe to re-run, and reports a descriptive outcome
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Background Tasks
//!
//! The periodic task surface. Tasks run unattended: every error path
//! resolves to a returned report or error value that the driver logs, never
//! an uncaught panic. Each function takes the tick instant or current date
//! explicitly so runs are reproducible under test.

pub mod reminders;
pub mod reports;
pub mod scheduler;
pub mod statistics;

pub use reminders::{
    send_bedtime_reminders, send_log_reminders, send_wake_reminders, ReminderRun,
};
pub use reports::{send_weekly_reports, ReportRun};
pub use statistics::{calculate_daily_statistics, calculate_weekly_statistics, StatsRun};

use crate::calendar::sync::{sync_session, SyncError, SyncOutcome};
use crate::calendar::CalendarService;
use crate::database::Database;
use tracing::{info, warn};
use uuid::Uuid;

/// Sync one session to the owner's remote calendar
///
/// Triggered after session create/update when the owner has calendar sync
/// enabled, and by the manual sync endpoint. Failures leave local state
/// unchanged, so re-invoking later is always safe.
///
/// # Errors
///
/// Returns the sync failure so callers and the operational log can tell
/// retryable remote failures from re-authorization cases.
pub async fn sync_sleep_to_calendar(
    database: &Database,
    calendar: &dyn CalendarService,
    session_id: Uuid,
) -> Result<SyncOutcome, SyncError> {
    match sync_session(database, calendar, session_id).await {
        Ok(outcome) => {
            info!("Calendar sync for session {session_id}: {outcome}");
            Ok(outcome)
        }
        Err(e) => {
            warn!("Calendar sync for session {session_id} failed: {e}");
            Err(e)
        }
    }
}
