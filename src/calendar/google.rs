// ABOUTME: Google Calendar API integration over its REST v3 surface
// ABOUTME: Handles event create/update/delete/list and refresh-token exchange
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::{CalendarError, CalendarService, EventDetails, RemoteEvent};
use crate::http_client::api_client;
use crate::models::CalendarCredential;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, warn};

/// Configuration for Google Calendar API integration
#[derive(Debug, Clone)]
pub struct GoogleCalendarConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Token endpoint for refresh-token exchange
    pub token_url: String,
    /// API base URL
    pub api_base: String,
    /// Target calendar; the user's primary calendar by default
    pub calendar_id: String,
    /// Request timeout in seconds for remote calls
    pub timeout_secs: u64,
    /// Connection timeout in seconds for remote calls
    pub connect_timeout_secs: u64,
}

impl Default for GoogleCalendarConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            token_url: "https://oauth2.googleapis.com/token".into(),
            api_base: "https://www.googleapis.com/calendar/v3".into(),
            calendar_id: "primary".into(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl GoogleCalendarConfig {
    /// Load configuration from environment variables, with defaults for
    /// everything except the OAuth client credentials
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            token_url: env::var("GOOGLE_TOKEN_URL").unwrap_or(defaults.token_url),
            api_base: env::var("GOOGLE_CALENDAR_API_BASE").unwrap_or(defaults.api_base),
            calendar_id: env::var("GOOGLE_CALENDAR_ID").unwrap_or(defaults.calendar_id),
            timeout_secs: defaults.timeout_secs,
            connect_timeout_secs: defaults.connect_timeout_secs,
        }
    }
}

/// Google Calendar client
///
/// Holds only the HTTP client and static configuration; the per-user
/// credential is an argument to every call.
pub struct GoogleCalendar {
    client: Client,
    config: GoogleCalendarConfig,
}

/// Event payload in the shape the Google API expects
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventBody<'a> {
    summary: &'a str,
    description: &'a str,
    start: GoogleEventTime,
    end: GoogleEventTime,
    color_id: &'a str,
    /// "transparent" keeps sleep blocks from showing as busy
    transparency: &'a str,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventTime {
    date_time: DateTime<Utc>,
    time_zone: String,
}

#[derive(Debug, Deserialize)]
struct GoogleEventResponse {
    id: String,
}

/// Lenient timing shape for listed events; all-day events carry no dateTime
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleListTime {
    date_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventListItem {
    id: String,
    summary: Option<String>,
    start: Option<GoogleListTime>,
    end: Option<GoogleListTime>,
}

#[derive(Debug, Deserialize)]
struct GoogleEventListResponse {
    #[serde(default)]
    items: Vec<GoogleEventListItem>,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    scope: Option<String>,
}

impl GoogleCalendar {
    /// Create a client from configuration
    #[must_use]
    pub fn new(config: GoogleCalendarConfig) -> Self {
        let client = api_client(config.timeout_secs, config.connect_timeout_secs);
        Self { client, config }
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.config.api_base, self.config.calendar_id
        )
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{event_id}", self.events_url())
    }

    /// Map a non-success response to the error taxonomy
    async fn response_error(response: reqwest::Response) -> CalendarError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            CalendarError::Unauthenticated(format!("{status}: {body}"))
        } else {
            CalendarError::Remote(format!("{status}: {body}"))
        }
    }

    fn transport_error(e: &reqwest::Error) -> CalendarError {
        CalendarError::Remote(format!("transport failure: {e}"))
    }

    async fn send_event(
        &self,
        request: reqwest::RequestBuilder,
        details: &EventDetails,
    ) -> Result<String, CalendarError> {
        let body = GoogleEventBody {
            summary: &details.summary,
            description: &details.description,
            start: GoogleEventTime {
                date_time: details.start,
                time_zone: details.time_zone.clone(),
            },
            end: GoogleEventTime {
                date_time: details.end,
                time_zone: details.time_zone.clone(),
            },
            color_id: "9",
            transparency: "transparent",
        };

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        if !response.status().is_success() {
            return Err(Self::response_error(response).await);
        }

        let event: GoogleEventResponse = response
            .json()
            .await
            .map_err(|e| CalendarError::Malformed(e.to_string()))?;

        Ok(event.id)
    }
}

#[async_trait]
impl CalendarService for GoogleCalendar {
    fn name(&self) -> &str {
        "google_calendar"
    }

    async fn create_event(
        &self,
        credential: &CalendarCredential,
        details: &EventDetails,
    ) -> Result<String, CalendarError> {
        debug!("Creating calendar event: {}", details.summary);
        let request = self
            .client
            .post(self.events_url())
            .bearer_auth(&credential.access_token);

        self.send_event(request, details).await
    }

    async fn update_event(
        &self,
        credential: &CalendarCredential,
        event_id: &str,
        details: &EventDetails,
    ) -> Result<String, CalendarError> {
        debug!("Updating calendar event {event_id}: {}", details.summary);
        let request = self
            .client
            .put(self.event_url(event_id))
            .bearer_auth(&credential.access_token);

        self.send_event(request, details).await
    }

    async fn delete_event(
        &self,
        credential: &CalendarCredential,
        event_id: &str,
    ) -> Result<(), CalendarError> {
        let response = self
            .client
            .delete(self.event_url(event_id))
            .bearer_auth(&credential.access_token)
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        // Gone already counts as deleted
        if response.status() == StatusCode::NOT_FOUND || response.status() == StatusCode::GONE {
            return Ok(());
        }

        if !response.status().is_success() {
            return Err(Self::response_error(response).await);
        }

        Ok(())
    }

    async fn list_upcoming(
        &self,
        credential: &CalendarCredential,
        max_results: usize,
    ) -> Result<Vec<RemoteEvent>, CalendarError> {
        let response = self
            .client
            .get(self.events_url())
            .bearer_auth(&credential.access_token)
            .query(&[
                ("timeMin", Utc::now().to_rfc3339()),
                ("maxResults", max_results.to_string()),
                ("singleEvents", "true".to_owned()),
                ("orderBy", "startTime".to_owned()),
            ])
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        if !response.status().is_success() {
            return Err(Self::response_error(response).await);
        }

        let listing: GoogleEventListResponse = response
            .json()
            .await
            .map_err(|e| CalendarError::Malformed(e.to_string()))?;

        Ok(listing
            .items
            .into_iter()
            .map(|item| RemoteEvent {
                id: item.id,
                summary: item.summary,
                start: item.start.and_then(|t| t.date_time),
                end: item.end.and_then(|t| t.date_time),
            })
            .collect())
    }

    async fn refresh_credential(
        &self,
        credential: &CalendarCredential,
    ) -> Result<CalendarCredential, CalendarError> {
        if credential.refresh_token.is_empty() {
            return Err(CalendarError::Unauthenticated(
                "no refresh token on file".into(),
            ));
        }
        if self.config.client_id.is_empty() || self.config.client_secret.is_empty() {
            return Err(CalendarError::Unauthenticated(
                "calendar client credentials not configured".into(),
            ));
        }

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", credential.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            warn!("Calendar token refresh rejected: {body}");
            return Err(CalendarError::Unauthenticated(format!("{status}: {body}")));
        }
        if !status.is_success() {
            return Err(Self::response_error(response).await);
        }

        let token: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| CalendarError::Malformed(e.to_string()))?;

        let now = Utc::now();
        Ok(CalendarCredential {
            user_id: credential.user_id,
            access_token: token.access_token,
            // The token endpoint omits the refresh token when it is unchanged
            refresh_token: token
                .refresh_token
                .unwrap_or_else(|| credential.refresh_token.clone()),
            expires_at: token.expires_in.map(|secs| now + Duration::seconds(secs)),
            scope: token.scope.or_else(|| credential.scope.clone()),
            updated_at: now,
        })
    }
}
