// ABOUTME: Shared test utilities and mock collaborators for integration tests
// ABOUTME: Provides database, user, session, calendar, and mailer test helpers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
#![allow(dead_code)]

//! Shared test utilities for `somnus_server`
//!
//! Common setup functions and mock collaborators used across the
//! integration tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use somnus_server::{
    calendar::{CalendarError, CalendarService, EventDetails, RemoteEvent},
    database::Database,
    models::{CalendarCredential, QualityRating, SleepSession, User, UserProfile},
    notifications::{NotificationSender, NotifyError, OutboundMessage},
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard test database setup
pub async fn create_test_database() -> Result<Arc<Database>> {
    init_test_logging();
    Ok(Arc::new(Database::new("sqlite::memory:").await?))
}

/// Create a user with the default profile
pub async fn create_test_user(database: &Database, email: &str) -> Result<User> {
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_owned(),
        display_name: None,
        is_active: true,
        created_at: Utc::now(),
    };
    database.create_user(&user).await?;
    database.get_or_create_profile(user.id).await?;
    Ok(user)
}

/// Persist a session with the given timestamps and rating
pub async fn seed_session(
    database: &Database,
    user_id: Uuid,
    sleep_time: DateTime<Utc>,
    wake_time: DateTime<Utc>,
    quality: Option<QualityRating>,
) -> Result<SleepSession> {
    let session = SleepSession::new(user_id, sleep_time, wake_time, quality, String::new());
    database.create_session(&session).await?;
    Ok(session)
}

/// Persist a calendar credential for a user
pub async fn seed_credential(
    database: &Database,
    user_id: Uuid,
    expires_at: Option<DateTime<Utc>>,
) -> Result<CalendarCredential> {
    let credential = CalendarCredential {
        user_id,
        access_token: "test-access-token".into(),
        refresh_token: "test-refresh-token".into(),
        expires_at,
        scope: Some("calendar".into()),
        updated_at: Utc::now(),
    };
    database.upsert_calendar_credential(&credential).await?;
    Ok(credential)
}

/// Enable calendar sync on a user's profile
pub async fn enable_calendar(database: &Database, user_id: Uuid) -> Result<UserProfile> {
    let mut profile = database.get_or_create_profile(user_id).await?;
    profile.calendar_enabled = true;
    database.upsert_profile(&profile).await?;
    Ok(profile)
}

/// Fixed instant helper for deterministic task runs
pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

/// Mock remote calendar recording every call
#[derive(Default)]
pub struct MockCalendar {
    pub create_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    /// Event ids handed out by create, in order
    pub created_ids: Mutex<Vec<String>>,
    /// Event ids targeted by update, in order
    pub updated_ids: Mutex<Vec<String>>,
    /// When set, create/update/list fail with a transient remote error
    pub fail_remote: AtomicBool,
    /// When set, refresh fails as unauthenticated
    pub fail_refresh: AtomicBool,
}

impl MockCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_remote(&self) -> Result<(), CalendarError> {
        if self.fail_remote.load(Ordering::SeqCst) {
            return Err(CalendarError::Remote("calendar unreachable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CalendarService for MockCalendar {
    fn name(&self) -> &str {
        "mock_calendar"
    }

    async fn create_event(
        &self,
        _credential: &CalendarCredential,
        _details: &EventDetails,
    ) -> Result<String, CalendarError> {
        self.check_remote()?;
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let event_id = format!("event-{n}");
        self.created_ids.lock().unwrap().push(event_id.clone());
        Ok(event_id)
    }

    async fn update_event(
        &self,
        _credential: &CalendarCredential,
        event_id: &str,
        _details: &EventDetails,
    ) -> Result<String, CalendarError> {
        self.check_remote()?;
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.updated_ids.lock().unwrap().push(event_id.to_owned());
        Ok(event_id.to_owned())
    }

    async fn delete_event(
        &self,
        _credential: &CalendarCredential,
        _event_id: &str,
    ) -> Result<(), CalendarError> {
        self.check_remote()
    }

    async fn list_upcoming(
        &self,
        _credential: &CalendarCredential,
        _max_results: usize,
    ) -> Result<Vec<RemoteEvent>, CalendarError> {
        self.check_remote()?;
        Ok(Vec::new())
    }

    async fn refresh_credential(
        &self,
        credential: &CalendarCredential,
    ) -> Result<CalendarCredential, CalendarError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(CalendarError::Unauthenticated("refresh rejected".into()));
        }

        Ok(CalendarCredential {
            user_id: credential.user_id,
            access_token: "refreshed-access-token".into(),
            refresh_token: credential.refresh_token.clone(),
            expires_at: Some(Utc::now() + Duration::hours(1)),
            scope: credential.scope.clone(),
            updated_at: Utc::now(),
        })
    }
}

/// Mock notification transport recording every accepted message
#[derive(Default)]
pub struct MockMailer {
    pub sent: Mutex<Vec<OutboundMessage>>,
    /// When set, every send fails at the transport level
    pub fail: AtomicBool,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.fail.store(true, Ordering::SeqCst);
        mailer
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.recipient.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationSender for MockMailer {
    fn name(&self) -> &str {
        "mock_mailer"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<u32, NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Transport("relay unreachable".into()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(1)
    }
}
