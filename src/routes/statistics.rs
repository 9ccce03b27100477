// ABOUTME: Sleep statistics route handlers (read-only)
// ABOUTME: Serves persisted aggregation rows and an on-demand 30-day summary

use super::OwnerId;
use crate::errors::{AppError, AppResult};
use crate::models::{PeriodKind, SleepStatistics};
use crate::server::ServerResources;
use crate::tasks::statistics::summarize_sessions;
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Deserialize)]
pub struct ListStatisticsQuery {
    pub period_type: Option<PeriodKind>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SummaryResponse {
    Empty {
        message: String,
        sessions_count: i64,
    },
    Summary {
        period: String,
        total_sessions: i64,
        total_sleep_hours: f64,
        average_sleep_hours: f64,
        average_quality: Option<f64>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
}

fn db_error(e: &anyhow::Error) -> AppError {
    error!(error = %e, "Statistics store operation failed");
    AppError::database(e.to_string())
}

/// List the caller's persisted statistics rows, newest anchor first
pub async fn list_statistics(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
    Query(query): Query<ListStatisticsQuery>,
) -> AppResult<Json<Vec<SleepStatistics>>> {
    let stats = resources
        .database
        .statistics_for_user(user_id, query.period_type)
        .await
        .map_err(|e| db_error(&e))?;

    Ok(Json(stats))
}

/// On-demand summary over the last 30 days of sessions
pub async fn summary(
    State(resources): State<Arc<ServerResources>>,
    OwnerId(user_id): OwnerId,
) -> AppResult<Json<SummaryResponse>> {
    let now = Utc::now();
    let since = now - Duration::days(30);

    let sessions = resources
        .database
        .sessions_for_user(user_id, Some(since), None)
        .await
        .map_err(|e| db_error(&e))?;

    let Some(summary) = summarize_sessions(&sessions) else {
        return Ok(Json(SummaryResponse::Empty {
            message: "No sleep data available".into(),
            sessions_count: 0,
        }));
    };

    Ok(Json(SummaryResponse::Summary {
        period: "30_days".into(),
        total_sessions: summary.sessions_count,
        total_sleep_hours: summary.total_hours,
        average_sleep_hours: summary.average_hours,
        average_quality: summary.average_quality,
        start_date: since.date_naive(),
        end_date: now.date_naive(),
    }))
}
