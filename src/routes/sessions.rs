// ABOUTME: Sleep session route handlers
// ABOUTME: Handles session CRUD, range listings, and the calendar sync triggers

use super::OwnerId;
use crate::errors::{AppError, AppResult};
use crate::models::{duration_hours, QualityRating, SleepSession};
use crate::server::ServerResources;
use crate::tasks;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub sleep_time: DateTime<Utc>,
    pub wake_time: DateTime<Utc>,
    pub quality_rating: Option<u8>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    pub sleep_time: Option<DateTime<Utc>>,
    pub wake_time: Option<DateTime<Utc>>,
    pub quality_rating: Option<u8>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn db_error(e: &anyhow::Error) -> AppError {
    error!(error = %e, "Session store operation failed");
    AppError::database(e.to_string())
}

fn parse_rating(raw: Option<u8>) -> AppResult<Option<QualityRating>> {
    raw.map(|value| QualityRating::try_from(value).map_err(AppError::out_of_range))
        .transpose()
}

fn validate_ordering(sleep_time: DateTime<Utc>, wake_time: DateTime<Utc>) -> AppResult<()> {
    if wake_time <= sleep_time {
        return Err(AppError::invalid_input(
            "wake_time must be after sleep_time",
        ));
    }
    Ok(())
}

/// Kick off an asynchronous calendar sync so the request is not blocked
fn spawn_sync(resources: &Arc<ServerResources>, session_id: Uuid) {
    let database = Arc::clone(&resources.database);
    let calendar = Arc::clone(&resources.calendar);

    tokio::spawn(async move {
        // Outcome and failure are logged inside the task.
        let _ = tasks::sync_sleep_to_calendar(database.as_ref(), calendar.as_ref(), session_id)
            .await;
    });
}

async fn calendar_enabled(resources: &Arc<ServerResources>, user_id: Uuid) -> AppResult<bool> {
    let profile = resources
        .database
        .get_or_create_profile(user_id)
        .await
        .map_err(|e| db_error(&e))?;
    Ok(profile.calendar_enabled)
}

/// List the caller's sessions, newest first, optionally bounded by date
pub async fn list_sessions(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
    Query(query): Query<ListSessionsQuery>,
) -> AppResult<Json<Vec<SleepSession>>> {
    let start = query
        .start_date
        .map(|d| d.and_time(NaiveTime::MIN).and_utc());
    // end_date is inclusive; the range bound is exclusive
    let end = query
        .end_date
        .map(|d| d.and_time(NaiveTime::MIN).and_utc() + Duration::days(1));

    let sessions = resources
        .database
        .sessions_for_user(user_id, start, end)
        .await
        .map_err(|e| db_error(&e))?;

    Ok(Json(sessions))
}

/// Log a new sleep session
pub async fn create_session(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
    Json(request): Json<CreateSessionRequest>,
) -> AppResult<impl IntoResponse> {
    validate_ordering(request.sleep_time, request.wake_time)?;
    let rating = parse_rating(request.quality_rating)?;

    let session = SleepSession::new(
        user_id,
        request.sleep_time,
        request.wake_time,
        rating,
        request.notes.unwrap_or_default(),
    );

    resources
        .database
        .create_session(&session)
        .await
        .map_err(|e| db_error(&e))?;

    if calendar_enabled(&resources, user_id).await? {
        spawn_sync(&resources, session.id);
    }

    Ok((StatusCode::CREATED, Json(session)))
}

/// Sessions from the last seven days
pub async fn recent_sessions(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
) -> AppResult<Json<Vec<SleepSession>>> {
    let since = Utc::now() - Duration::days(7);
    let sessions = resources
        .database
        .sessions_for_user(user_id, Some(since), None)
        .await
        .map_err(|e| db_error(&e))?;

    Ok(Json(sessions))
}

/// Sessions whose sleep-start falls on today's date
pub async fn today_sessions(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
) -> AppResult<Json<Vec<SleepSession>>> {
    let start = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
    let sessions = resources
        .database
        .sessions_for_user(user_id, Some(start), Some(start + Duration::days(1)))
        .await
        .map_err(|e| db_error(&e))?;

    Ok(Json(sessions))
}

/// Get one session
pub async fn get_session(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<SleepSession>> {
    let session = resources
        .database
        .get_user_session(user_id, session_id)
        .await
        .map_err(|e| db_error(&e))?
        .ok_or_else(|| AppError::not_found("sleep session"))?;

    Ok(Json(session))
}

/// Edit a session; the duration is recomputed from the timestamp pair
pub async fn update_session(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
    Path(session_id): Path<Uuid>,
    Json(request): Json<UpdateSessionRequest>,
) -> AppResult<Json<SleepSession>> {
    let mut session = resources
        .database
        .get_user_session(user_id, session_id)
        .await
        .map_err(|e| db_error(&e))?
        .ok_or_else(|| AppError::not_found("sleep session"))?;

    if let Some(sleep_time) = request.sleep_time {
        session.sleep_time = sleep_time;
    }
    if let Some(wake_time) = request.wake_time {
        session.wake_time = wake_time;
    }
    validate_ordering(session.sleep_time, session.wake_time)?;

    if let Some(rating) = parse_rating(request.quality_rating)? {
        session.quality_rating = Some(rating);
    }
    if let Some(notes) = request.notes {
        session.notes = notes;
    }

    session.duration_hours = Some(duration_hours(session.sleep_time, session.wake_time));

    resources
        .database
        .update_session(&session)
        .await
        .map_err(|e| db_error(&e))?;

    if calendar_enabled(&resources, user_id).await? {
        spawn_sync(&resources, session.id);
    }

    Ok(Json(session))
}

/// Delete a session, removing its remote event when one was recorded
pub async fn delete_session(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
    Path(session_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let session = resources
        .database
        .get_user_session(user_id, session_id)
        .await
        .map_err(|e| db_error(&e))?
        .ok_or_else(|| AppError::not_found("sleep session"))?;

    // Best effort: a failed remote delete leaves an orphan event, not a
    // broken local store.
    if session.synced_to_calendar {
        if let Some(event_id) = session.calendar_event_id.as_deref() {
            let credential = resources
                .database
                .get_calendar_credential(user_id)
                .await
                .map_err(|e| db_error(&e))?;
            if let Some(credential) = credential {
                if let Err(e) = resources.calendar.delete_event(&credential, event_id).await {
                    warn!("Deleting remote event {event_id} failed: {e}");
                }
            }
        }
    }

    resources
        .database
        .delete_session(user_id, session_id)
        .await
        .map_err(|e| db_error(&e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Manually trigger a calendar sync for one session
pub async fn sync_session_now(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
    Path(session_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    resources
        .database
        .get_user_session(user_id, session_id)
        .await
        .map_err(|e| db_error(&e))?
        .ok_or_else(|| AppError::not_found("sleep session"))?;

    if !calendar_enabled(&resources, user_id).await? {
        return Err(AppError::invalid_input("Calendar sync is not enabled"));
    }

    spawn_sync(&resources, session_id);

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "message": "Sync initiated" })),
    ))
}
