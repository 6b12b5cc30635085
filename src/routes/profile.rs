use axum::{Extension, Json, extract::State};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{ProfileResponse, UpdateProfileRequest, User, UserPermissions, UserRole},
    queries::{permission_queries, user_queries},
    utils::{
        extractors::{JsonBody, extract_user_id},
        jwt::Claims,
        password,
    },
};

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ProfileResponse>> {
    let user_id = extract_user_id(&claims)?;

    let user = user_queries::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(profile_of(&state, user).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(payload): JsonBody<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    let user_id = extract_user_id(&claims)?;

    let password_hash = match payload.password.as_deref() {
        Some(new_password) => {
            password::validate_password(new_password)?;
            Some(password::hash_password(new_password, state.auth.bcrypt_cost).await?)
        }
        None => None,
    };

    let user = user_queries::update_profile(
        &state.db,
        user_id,
        payload.first_name.as_deref().map(str::trim),
        payload.last_name.as_deref().map(str::trim),
        password_hash.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(profile_of(&state, user).await?))
}

async fn profile_of(state: &AppState, user: User) -> Result<ProfileResponse> {
    // The stored role is authoritative; the token may predate a role change.
    let permissions = match user.role {
        UserRole::Admin => {
            let stored = permission_queries::find_by_user_id(&state.db, user.id).await?;
            Some(UserPermissions::effective(user.role, stored))
        }
        UserRole::Customer => None,
    };

    Ok(ProfileResponse {
        user: user.into(),
        permissions,
    })
}
