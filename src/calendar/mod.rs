// ABOUTME: Calendar module organizing the remote calendar contract and session sync
// ABOUTME: Centralizes the provider trait, credential refresh, and sync adapter
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Calendar Management Module
//!
//! The remote calendar service is an opaque collaborator with a
//! create/update/delete/list event contract. This module defines that
//! contract behind a trait seam, the concrete Google Calendar client, and
//! the sync adapter that keeps sessions mapped one-to-one to remote events.

pub mod google;
pub mod sync;

use crate::models::{CalendarCredential, QualityRating, SleepSession, UserProfile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Details for a remote calendar event mirroring one sleep session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventDetails {
    pub summary: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// IANA timezone name the remote service should render the event in
    pub time_zone: String,
}

impl EventDetails {
    /// Build the event mirroring a session, rendered in the owner's timezone
    #[must_use]
    pub fn for_session(session: &SleepSession, profile: &UserProfile) -> Self {
        let duration = session.duration_hours.unwrap_or(0.0);
        let quality = session
            .quality_rating
            .map_or("Not rated", QualityRating::label);

        Self {
            summary: format!("Sleep ({duration}h)"),
            description: format!("Sleep quality: {quality}\nNotes: {}", session.notes),
            start: session.sleep_time,
            end: session.wake_time,
            time_zone: profile.timezone.clone(),
        }
    }
}

/// One event returned by the remote listing call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub id: String,
    pub summary: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Calendar service error types
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    /// The credential was rejected or could not be refreshed; the user must
    /// re-authorize. Never worth an automatic retry.
    #[error("calendar authorization failed: {0}")]
    Unauthenticated(String),

    /// The remote service was unreachable, rate-limited, or returned a
    /// server error. Safe to retry on the next trigger.
    #[error("remote calendar request failed: {0}")]
    Remote(String),

    /// The remote service answered with something we could not interpret
    #[error("unexpected calendar service response: {0}")]
    Malformed(String),
}

/// Trait for remote calendar service implementations
///
/// Implementations are stateless with respect to users: the resolved
/// credential is passed into every call, so nothing authenticated is cached
/// across concurrent task executions.
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Create a remote event, returning its id
    async fn create_event(
        &self,
        credential: &CalendarCredential,
        details: &EventDetails,
    ) -> Result<String, CalendarError>;

    /// Update an existing remote event in place, returning its id
    async fn update_event(
        &self,
        credential: &CalendarCredential,
        event_id: &str,
        details: &EventDetails,
    ) -> Result<String, CalendarError>;

    /// Delete a remote event
    async fn delete_event(
        &self,
        credential: &CalendarCredential,
        event_id: &str,
    ) -> Result<(), CalendarError>;

    /// List upcoming events, soonest first
    async fn list_upcoming(
        &self,
        credential: &CalendarCredential,
        max_results: usize,
    ) -> Result<Vec<RemoteEvent>, CalendarError>;

    /// Exchange the refresh token for a fresh credential record
    ///
    /// Returns a new record; the caller persists it. The input credential
    /// is never mutated.
    async fn refresh_credential(
        &self,
        credential: &CalendarCredential,
    ) -> Result<CalendarCredential, CalendarError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    #[test]
    fn event_details_render_quality_and_notes() {
        let user_id = Uuid::new_v4();
        let session = SleepSession::new(
            user_id,
            Utc.with_ymd_and_hms(2025, 4, 1, 22, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 4, 2, 6, 0, 0).unwrap(),
            Some(QualityRating::Good),
            "slept early".into(),
        );
        let mut profile = UserProfile::default_for(user_id);
        profile.timezone = "Europe/Paris".into();

        let details = EventDetails::for_session(&session, &profile);
        assert_eq!(details.summary, "Sleep (8h)");
        assert!(details.description.contains("Sleep quality: Good"));
        assert!(details.description.contains("Notes: slept early"));
        assert_eq!(details.time_zone, "Europe/Paris");
    }

    #[test]
    fn event_details_unrated_session() {
        let user_id = Uuid::new_v4();
        let session = SleepSession::new(
            user_id,
            Utc.with_ymd_and_hms(2025, 4, 1, 23, 30, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 4, 2, 7, 0, 0).unwrap(),
            None,
            String::new(),
        );
        let profile = UserProfile::default_for(user_id);

        let details = EventDetails::for_session(&session, &profile);
        assert!(details.description.contains("Not rated"));
        assert_eq!(details.time_zone, "UTC");
    }
}
