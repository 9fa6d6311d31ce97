use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::api_client::{ApiError, SessionInfo};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionInfo>, AppError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "username and password are required".to_string(),
        ));
    }

    match state.api.login(req.username.trim(), &req.password).await {
        Ok(info) => Ok(Json(info)),
        Err(ApiError::Unauthorized) => Err(AppError::Unauthorized),
        Err(e) => Err(e.into()),
    }
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(State(state): State<AppState>) -> StatusCode {
    state.api.logout().await;
    StatusCode::NO_CONTENT
}

/// GET /api/v1/auth/session
pub async fn handle_session(State(state): State<AppState>) -> Json<SessionInfo> {
    Json(state.api.session().info().await)
}
