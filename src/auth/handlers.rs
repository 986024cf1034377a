use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::auth::jwt;
use crate::auth::types::*;
use crate::auth::utils::*;
use crate::error::{server_error, ApiError};
use crate::model::user::User;
use crate::state::AppState;

pub async fn register_handler(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let email = req.email.trim().to_lowercase();

    let existing = state
        .db
        .find_user_by_email(&email)
        .await
        .map_err(server_error)?;
    if existing.is_some() {
        return Err((StatusCode::BAD_REQUEST, "User already exists".into()));
    }

    let hash = hash_password(&req.password).map_err(server_error)?;

    let user = User {
        id: Uuid::new_v4().to_string(),
        username: req.username,
        email: email.clone(),
        password_hash: hash,
        created_ts: chrono::Utc::now().timestamp(),
    };

    state.db.save_user(&user).await.map_err(server_error)?;

    let token = jwt::issue(&state.jwt_secret, &user.id).map_err(server_error)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            id: user.id,
            username: user.username,
            email,
            token,
        }),
    ))
}

pub async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = req.email.trim().to_lowercase();

    // Same response for unknown email and wrong password.
    let invalid = || (StatusCode::BAD_REQUEST, "Invalid credentials".to_string());

    let user = state
        .db
        .find_user_by_email(&email)
        .await
        .map_err(server_error)?
        .ok_or_else(invalid)?;

    let valid = verify_password(&user.password_hash, &req.password).map_err(server_error)?;
    if !valid {
        return Err(invalid());
    }

    let token = jwt::issue(&state.jwt_secret, &user.id).map_err(server_error)?;

    Ok(Json(AuthResponse {
        id: user.id,
        username: user.username,
        email,
        token,
    }))
}
