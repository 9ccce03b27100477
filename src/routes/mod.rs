// ABOUTME: HTTP REST route assembly for the sleep tracker API
// ABOUTME: Wires per-entity handlers onto the router and extracts the owner identity
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! HTTP routes for the user-facing CRUD surface
//!
//! Every entity route is scoped to the owning user. The owner identity
//! arrives in the `x-user-id` header; resolving that header from a real
//! authentication layer is an out-of-scope concern of the deployment's
//! front door.

pub mod goals;
pub mod profiles;
pub mod reminders;
pub mod sessions;
pub mod statistics;
pub mod users;

use crate::errors::AppError;
use crate::server::ServerResources;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Owner identity extracted from the `x-user-id` header
#[derive(Debug, Clone, Copy)]
pub struct OwnerId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-user-id")
            .ok_or_else(AppError::auth_required)?
            .to_str()
            .map_err(|_| AppError::invalid_input("x-user-id header is not valid text"))?;

        let user_id = Uuid::parse_str(raw)
            .map_err(|_| AppError::invalid_input("x-user-id header is not a valid UUID"))?;

        Ok(Self(user_id))
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": env!("CARGO_PKG_NAME") }))
}

/// Build the application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/users", post(users::register))
        .route(
            "/api/profile",
            get(profiles::get_profile).put(profiles::update_profile),
        )
        .route(
            "/api/profile/calendar",
            get(profiles::calendar_status)
                .post(profiles::connect_calendar)
                .delete(profiles::disconnect_calendar),
        )
        .route(
            "/api/sessions",
            get(sessions::list_sessions).post(sessions::create_session),
        )
        .route("/api/sessions/recent", get(sessions::recent_sessions))
        .route("/api/sessions/today", get(sessions::today_sessions))
        .route(
            "/api/sessions/:id",
            get(sessions::get_session)
                .put(sessions::update_session)
                .delete(sessions::delete_session),
        )
        .route("/api/sessions/:id/sync", post(sessions::sync_session_now))
        .route("/api/goals", get(goals::list_goals).post(goals::create_goal))
        .route("/api/goals/active", get(goals::active_goals))
        .route(
            "/api/goals/:id",
            put(goals::update_goal).delete(goals::delete_goal),
        )
        .route(
            "/api/reminders",
            get(reminders::list_reminders).post(reminders::create_reminder),
        )
        .route("/api/reminders/active", get(reminders::active_reminders))
        .route(
            "/api/reminders/:id",
            put(reminders::update_reminder).delete(reminders::delete_reminder),
        )
        .route("/api/statistics", get(statistics::list_statistics))
        .route("/api/statistics/summary", get(statistics::summary))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(resources)
}
