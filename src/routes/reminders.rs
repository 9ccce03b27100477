// ABOUTME: Sleep reminder route handlers
// ABOUTME: Handles reminder CRUD; last_sent is owned by the scheduler, not this surface

use super::OwnerId;
use crate::errors::{AppError, AppResult};
use crate::models::{ReminderKind, SleepReminder};
use crate::server::ServerResources;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateReminderRequest {
    pub kind: ReminderKind,
    pub reminder_time: NaiveTime,
    pub message: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReminderRequest {
    pub kind: Option<ReminderKind>,
    pub reminder_time: Option<NaiveTime>,
    pub message: Option<String>,
    pub is_active: Option<bool>,
}

fn db_error(e: &anyhow::Error) -> AppError {
    error!(error = %e, "Reminder store operation failed");
    AppError::database(e.to_string())
}

/// List all of the caller's reminders
pub async fn list_reminders(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
) -> AppResult<Json<Vec<SleepReminder>>> {
    let reminders = resources
        .database
        .reminders_for_user(user_id, false)
        .await
        .map_err(|e| db_error(&e))?;

    Ok(Json(reminders))
}

/// List only the caller's active reminders
pub async fn active_reminders(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
) -> AppResult<Json<Vec<SleepReminder>>> {
    let reminders = resources
        .database
        .reminders_for_user(user_id, true)
        .await
        .map_err(|e| db_error(&e))?;

    Ok(Json(reminders))
}

/// Create a reminder
pub async fn create_reminder(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
    Json(request): Json<CreateReminderRequest>,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now();
    let reminder = SleepReminder {
        id: Uuid::new_v4(),
        user_id,
        kind: request.kind,
        reminder_time: request.reminder_time,
        is_active: request.is_active.unwrap_or(true),
        message: request.message,
        last_sent: None,
        created_at: now,
        updated_at: now,
    };

    resources
        .database
        .create_reminder(&reminder)
        .await
        .map_err(|e| db_error(&e))?;

    Ok((StatusCode::CREATED, Json(reminder)))
}

/// Apply a partial update to a reminder
pub async fn update_reminder(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
    Path(reminder_id): Path<Uuid>,
    Json(request): Json<UpdateReminderRequest>,
) -> AppResult<Json<SleepReminder>> {
    let reminders = resources
        .database
        .reminders_for_user(user_id, false)
        .await
        .map_err(|e| db_error(&e))?;
    let mut reminder = reminders
        .into_iter()
        .find(|r| r.id == reminder_id)
        .ok_or_else(|| AppError::not_found("sleep reminder"))?;

    if let Some(kind) = request.kind {
        reminder.kind = kind;
    }
    if let Some(time) = request.reminder_time {
        reminder.reminder_time = time;
    }
    if let Some(message) = request.message {
        reminder.message = Some(message);
    }
    if let Some(active) = request.is_active {
        reminder.is_active = active;
    }

    resources
        .database
        .update_reminder(&reminder)
        .await
        .map_err(|e| db_error(&e))?;

    Ok(Json(reminder))
}

/// Delete a reminder
pub async fn delete_reminder(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
    Path(reminder_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let deleted = resources
        .database
        .delete_reminder(user_id, reminder_id)
        .await
        .map_err(|e| db_error(&e))?;

    if !deleted {
        return Err(AppError::not_found("sleep reminder"));
    }

    Ok(StatusCode::NO_CONTENT)
}
