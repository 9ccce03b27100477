// ABOUTME: User profile route handlers
// ABOUTME: Handles profile read/update and the calendar connection surface

use super::OwnerId;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::calendar::{CalendarError, RemoteEvent};
use crate::models::{CalendarCredential, UserProfile};
use crate::server::ServerResources;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub target_sleep_hours: Option<f64>,
    pub timezone: Option<String>,
    pub notification_enabled: Option<bool>,
    pub notification_time: Option<NaiveTime>,
    pub calendar_enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectCalendarRequest {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CalendarStatusResponse {
    pub connected: bool,
    pub enabled: bool,
    pub upcoming: Vec<RemoteEvent>,
}

fn db_error(e: &anyhow::Error) -> AppError {
    error!(error = %e, "Profile store operation failed");
    AppError::database(e.to_string())
}

/// Get the caller's profile, creating the default on first access
pub async fn get_profile(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
) -> AppResult<Json<UserProfile>> {
    let profile = resources
        .database
        .get_or_create_profile(user_id)
        .await
        .map_err(|e| db_error(&e))?;

    Ok(Json(profile))
}

/// Apply a partial update to the caller's profile
pub async fn update_profile(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
    Json(request): Json<UpdateProfileRequest>,
) -> AppResult<Json<UserProfile>> {
    let mut profile = resources
        .database
        .get_or_create_profile(user_id)
        .await
        .map_err(|e| db_error(&e))?;

    if let Some(hours) = request.target_sleep_hours {
        if !(1.0..=24.0).contains(&hours) {
            return Err(AppError::out_of_range(
                "target_sleep_hours must be between 1.0 and 24.0",
            ));
        }
        profile.target_sleep_hours = hours;
    }
    if let Some(timezone) = request.timezone {
        profile.timezone = timezone;
    }
    if let Some(enabled) = request.notification_enabled {
        profile.notification_enabled = enabled;
    }
    if let Some(time) = request.notification_time {
        profile.notification_time = Some(time);
    }
    if let Some(enabled) = request.calendar_enabled {
        profile.calendar_enabled = enabled;
    }

    resources
        .database
        .upsert_profile(&profile)
        .await
        .map_err(|e| db_error(&e))?;

    Ok(Json(profile))
}

/// Calendar connection status plus a peek at upcoming remote events
pub async fn calendar_status(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
) -> AppResult<Json<CalendarStatusResponse>> {
    let profile = resources
        .database
        .get_or_create_profile(user_id)
        .await
        .map_err(|e| db_error(&e))?;

    let Some(credential) = resources
        .database
        .get_calendar_credential(user_id)
        .await
        .map_err(|e| db_error(&e))?
    else {
        return Ok(Json(CalendarStatusResponse {
            connected: false,
            enabled: profile.calendar_enabled,
            upcoming: Vec::new(),
        }));
    };

    let upcoming = resources
        .calendar
        .list_upcoming(&credential, 5)
        .await
        .map_err(|e| match e {
            CalendarError::Unauthenticated(reason) => {
                AppError::new(ErrorCode::ExternalAuthFailed, reason)
            }
            CalendarError::Remote(msg) | CalendarError::Malformed(msg) => {
                AppError::external_service(resources.calendar.name(), msg)
            }
        })?;

    Ok(Json(CalendarStatusResponse {
        connected: true,
        enabled: profile.calendar_enabled,
        upcoming,
    }))
}

/// Store the credential produced by the out-of-scope authorization flow
/// and enable calendar sync for the caller
pub async fn connect_calendar(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
    Json(request): Json<ConnectCalendarRequest>,
) -> AppResult<impl IntoResponse> {
    if request.access_token.is_empty() || request.refresh_token.is_empty() {
        return Err(AppError::invalid_input(
            "access_token and refresh_token are required",
        ));
    }

    let credential = CalendarCredential {
        user_id,
        access_token: request.access_token,
        refresh_token: request.refresh_token,
        expires_at: request.expires_at,
        scope: request.scope,
        updated_at: Utc::now(),
    };

    resources
        .database
        .upsert_calendar_credential(&credential)
        .await
        .map_err(|e| db_error(&e))?;
    resources
        .database
        .set_calendar_enabled(user_id, true)
        .await
        .map_err(|e| db_error(&e))?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Calendar connected successfully",
            "enabled": true
        })),
    ))
}

/// Drop the stored credential and disable calendar sync
pub async fn disconnect_calendar(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
) -> AppResult<impl IntoResponse> {
    resources
        .database
        .delete_calendar_credential(user_id)
        .await
        .map_err(|e| db_error(&e))?;
    resources
        .database
        .set_calendar_enabled(user_id, false)
        .await
        .map_err(|e| db_error(&e))?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Calendar disconnected",
            "enabled": false
        })),
    ))
}
