use axum::{Json, extract::State, extract::rejection::JsonRejection};
use tracing::info;

use chainpoll_types::api::{LoginRequest, LoginResponse, RegisterRequest, UserResponse};

use crate::AppState;
use crate::error::ApiError;

const MAX_USERNAME_CHARS: usize = 64;

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(req) = body?;

    // Validate input
    if req.username.trim().is_empty() {
        return Err(ApiError::validation("username", "must not be empty"));
    }
    if req.username.chars().count() > MAX_USERNAME_CHARS {
        return Err(ApiError::validation(
            "username",
            format!("must be at most {MAX_USERNAME_CHARS} characters"),
        ));
    }
    if req.password.is_empty() {
        return Err(ApiError::validation("password", "must not be empty"));
    }

    let user = state.auth.register(&req.username, &req.password).await?;
    info!("Registered user {}", user.username);

    Ok(Json(UserResponse {
        username: user.username,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = body?;

    if req.username.is_empty() {
        return Err(ApiError::validation("username", "must not be empty"));
    }
    if req.password.is_empty() {
        return Err(ApiError::validation("password", "must not be empty"));
    }

    let (user, access_token) = state.auth.authenticate(&req.username, &req.password).await?;

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".into(),
        user: UserResponse {
            username: user.username,
        },
    }))
}
