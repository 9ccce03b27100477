// ABOUTME: Calendar sync adapter keeping sessions mapped one-to-one to remote events
// ABOUTME: Resolves credentials per call and records the session-to-event mapping

//! # Session Calendar Sync
//!
//! Maintains the one-to-one mapping between a sleep session and a remote
//! calendar event. Syncing an unsynced session creates a remote event and
//! records the returned id; syncing an already-synced session updates the
//! stored event in place. Calling sync twice never creates a duplicate.

use super::{CalendarError, CalendarService, EventDetails};
use crate::database::Database;
use crate::models::CalendarCredential;
use chrono::Utc;
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;

/// Terminal states of one sync invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A remote event was created and its id recorded on the session
    Created { event_id: String },
    /// The existing remote event was updated in place
    Updated { event_id: String },
    /// The owner has calendar sync disabled; nothing to do
    SkippedDisabled,
    /// The session vanished before the task executed; descriptive no-op
    SessionNotFound(Uuid),
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created { event_id } => write!(f, "created calendar event {event_id}"),
            Self::Updated { event_id } => write!(f, "updated calendar event {event_id}"),
            Self::SkippedDisabled => write!(f, "calendar sync not enabled for this user"),
            Self::SessionNotFound(id) => write!(f, "sleep session {id} not found"),
        }
    }
}

/// Sync failure modes
///
/// A failed sync leaves local session state unchanged in every case, so the
/// operation is safe to invoke again later.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Credential missing, rejected, or unrefreshable; remediation is user
    /// re-authorization, not retry
    #[error("calendar sync unauthorized for user {user_id}: {reason}")]
    Unauthenticated { user_id: Uuid, reason: String },

    /// Remote service failure; safe to retry on the next trigger
    #[error("calendar sync failed: {0}")]
    Remote(String),

    /// Store failure while loading or recording sync state
    #[error("database failure during calendar sync: {0}")]
    Database(String),
}

impl SyncError {
    fn from_calendar(user_id: Uuid, error: CalendarError) -> Self {
        match error {
            CalendarError::Unauthenticated(reason) => Self::Unauthenticated { user_id, reason },
            CalendarError::Remote(msg) | CalendarError::Malformed(msg) => Self::Remote(msg),
        }
    }
}

/// Resolve a credential that is valid right now, refreshing through the
/// service when the stored one has expired.
///
/// The refreshed record replaces the stored one before it is returned, so a
/// concurrent sync picks up the new token instead of racing the old one.
///
/// # Errors
///
/// `Unauthenticated` when no credential is on file or refresh is rejected;
/// `Remote` when the refresh call cannot reach the service.
pub async fn ensure_valid_credential(
    database: &Database,
    calendar: &dyn CalendarService,
    user_id: Uuid,
) -> Result<CalendarCredential, SyncError> {
    let credential = database
        .get_calendar_credential(user_id)
        .await
        .map_err(|e| SyncError::Database(e.to_string()))?
        .ok_or_else(|| SyncError::Unauthenticated {
            user_id,
            reason: "no calendar credential on file".into(),
        })?;

    if credential.is_valid(Utc::now()) {
        return Ok(credential);
    }

    info!("Refreshing calendar credential for user {user_id}");
    let refreshed = calendar
        .refresh_credential(&credential)
        .await
        .map_err(|e| SyncError::from_calendar(user_id, e))?;

    database
        .upsert_calendar_credential(&refreshed)
        .await
        .map_err(|e| SyncError::Database(e.to_string()))?;

    Ok(refreshed)
}

/// Sync one session to the owner's remote calendar
///
/// # Errors
///
/// Returns a `SyncError` when the credential cannot be resolved, the remote
/// call fails, or the store fails; local session state is left unchanged on
/// every error path.
pub async fn sync_session(
    database: &Database,
    calendar: &dyn CalendarService,
    session_id: Uuid,
) -> Result<SyncOutcome, SyncError> {
    let Some(session) = database
        .get_session(session_id)
        .await
        .map_err(|e| SyncError::Database(e.to_string()))?
    else {
        return Ok(SyncOutcome::SessionNotFound(session_id));
    };

    let profile = database
        .get_or_create_profile(session.user_id)
        .await
        .map_err(|e| SyncError::Database(e.to_string()))?;

    if !profile.calendar_enabled {
        return Ok(SyncOutcome::SkippedDisabled);
    }

    let credential = ensure_valid_credential(database, calendar, session.user_id).await?;
    let details = EventDetails::for_session(&session, &profile);

    if session.synced_to_calendar {
        if let Some(event_id) = session.calendar_event_id.as_deref() {
            let event_id = calendar
                .update_event(&credential, event_id, &details)
                .await
                .map_err(|e| SyncError::from_calendar(session.user_id, e))?;

            return Ok(SyncOutcome::Updated { event_id });
        }
        // Synced flag without a stored id cannot be updated in place;
        // fall through and create, which repairs the mapping.
        warn!("Session {session_id} marked synced without an event id; recreating");
    }

    let event_id = calendar
        .create_event(&credential, &details)
        .await
        .map_err(|e| SyncError::from_calendar(session.user_id, e))?;

    database
        .mark_session_synced(session.id, &event_id)
        .await
        .map_err(|e| SyncError::Database(e.to_string()))?;

    Ok(SyncOutcome::Created { event_id })
}
