use axum::{Json, extract::State};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{AuthResponse, LoginRequest},
    queries::user_queries,
    utils::{extractors::JsonBody, jwt, password},
};

pub async fn login_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let user = user_queries::find_by_email(&state.db, payload.email.trim())
        .await?
        .ok_or_else(|| {
            tracing::warn!("Login attempt for unknown email");
            invalid()
        })?;

    if !password::verify_password(&payload.password, &user.password).await? {
        tracing::warn!("Failed login for user {}", user.id);
        return Err(invalid());
    }

    let token = jwt::generate_token(&state.auth, user.id, &user.email, user.role)?;

    tracing::info!("User {} logged in as {}", user.id, user.role.as_str());

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}
