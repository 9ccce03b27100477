// ABOUTME: User registration route handler
// ABOUTME: Creates the user record the rest of the surface keys on; auth itself is out of scope

use crate::errors::{AppError, AppResult};
use crate::models::User;
use crate::server::ServerResources;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: String,
    pub message: String,
}

/// Register a user and seed the default profile
pub async fn register(
    State(resources): State<Arc<ServerResources>>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    if request.email.is_empty() || !request.email.contains('@') {
        return Err(AppError::invalid_input("a valid email address is required"));
    }

    if resources
        .database
        .get_user_by_email(&request.email)
        .await
        .map_err(|e| {
            error!(error = %e, "User lookup failed");
            AppError::database(e.to_string())
        })?
        .is_some()
    {
        return Err(AppError::invalid_input("email is already registered"));
    }

    let user = User {
        id: Uuid::new_v4(),
        email: request.email,
        display_name: request.display_name,
        is_active: true,
        created_at: Utc::now(),
    };

    resources.database.create_user(&user).await.map_err(|e| {
        error!(error = %e, "User creation failed");
        AppError::database(e.to_string())
    })?;
    resources
        .database
        .get_or_create_profile(user.id)
        .await
        .map_err(|e| {
            error!(error = %e, "Profile creation failed");
            AppError::database(e.to_string())
        })?;

    info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id.to_string(),
            message: "User registered successfully".into(),
        }),
    ))
}
