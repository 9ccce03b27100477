// ABOUTME: Sleep goal route handlers
// ABOUTME: Handles goal CRUD; overlapping goals are allowed to coexist

use super::OwnerId;
use crate::errors::{AppError, AppResult};
use crate::models::SleepGoal;
use crate::server::ServerResources;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveTime, Utc, Weekday};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateGoalRequest {
    pub target_bedtime: NaiveTime,
    pub target_wake_time: NaiveTime,
    pub target_duration_hours: Option<f64>,
    pub days_of_week: Option<Vec<Weekday>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGoalRequest {
    pub target_bedtime: Option<NaiveTime>,
    pub target_wake_time: Option<NaiveTime>,
    pub target_duration_hours: Option<f64>,
    pub days_of_week: Option<Vec<Weekday>>,
    pub is_active: Option<bool>,
}

fn db_error(e: &anyhow::Error) -> AppError {
    error!(error = %e, "Goal store operation failed");
    AppError::database(e.to_string())
}

fn validate_duration(hours: f64) -> AppResult<()> {
    if !(1.0..=24.0).contains(&hours) {
        return Err(AppError::out_of_range(
            "target_duration_hours must be between 1.0 and 24.0",
        ));
    }
    Ok(())
}

/// List all of the caller's goals
pub async fn list_goals(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
) -> AppResult<Json<Vec<SleepGoal>>> {
    let goals = resources
        .database
        .goals_for_user(user_id, false)
        .await
        .map_err(|e| db_error(&e))?;

    Ok(Json(goals))
}

/// List only the caller's active goals; all of them apply, no resolution
/// policy picks a winner
pub async fn active_goals(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
) -> AppResult<Json<Vec<SleepGoal>>> {
    let goals = resources
        .database
        .goals_for_user(user_id, true)
        .await
        .map_err(|e| db_error(&e))?;

    Ok(Json(goals))
}

/// Create a goal
pub async fn create_goal(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
    Json(request): Json<CreateGoalRequest>,
) -> AppResult<impl IntoResponse> {
    let target_duration_hours = request.target_duration_hours.unwrap_or(8.0);
    validate_duration(target_duration_hours)?;

    let now = Utc::now();
    let goal = SleepGoal {
        id: Uuid::new_v4(),
        user_id,
        target_bedtime: request.target_bedtime,
        target_wake_time: request.target_wake_time,
        target_duration_hours,
        days_of_week: request.days_of_week.unwrap_or_default(),
        is_active: request.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };

    resources
        .database
        .create_goal(&goal)
        .await
        .map_err(|e| db_error(&e))?;

    Ok((StatusCode::CREATED, Json(goal)))
}

/// Apply a partial update to a goal
pub async fn update_goal(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
    Path(goal_id): Path<Uuid>,
    Json(request): Json<UpdateGoalRequest>,
) -> AppResult<Json<SleepGoal>> {
    let goals = resources
        .database
        .goals_for_user(user_id, false)
        .await
        .map_err(|e| db_error(&e))?;
    let mut goal = goals
        .into_iter()
        .find(|g| g.id == goal_id)
        .ok_or_else(|| AppError::not_found("sleep goal"))?;

    if let Some(bedtime) = request.target_bedtime {
        goal.target_bedtime = bedtime;
    }
    if let Some(wake_time) = request.target_wake_time {
        goal.target_wake_time = wake_time;
    }
    if let Some(hours) = request.target_duration_hours {
        validate_duration(hours)?;
        goal.target_duration_hours = hours;
    }
    if let Some(days) = request.days_of_week {
        goal.days_of_week = days;
    }
    if let Some(active) = request.is_active {
        goal.is_active = active;
    }

    resources
        .database
        .update_goal(&goal)
        .await
        .map_err(|e| db_error(&e))?;

    Ok(Json(goal))
}

/// Delete a goal
pub async fn delete_goal(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
    Path(goal_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let deleted = resources
        .database
        .delete_goal(user_id, goal_id)
        .await
        .map_err(|e| db_error(&e))?;

    if !deleted {
        return Err(AppError::not_found("sleep goal"));
    }

    Ok(StatusCode::NO_CONTENT)
}
