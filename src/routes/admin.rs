use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use super::register::validate_email;
use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        AdminWithPermissions, AnalyticsSummary, CreateAdminRequest, DeletedResponse,
        EffectivePermissions, Permission, PermissionRecord, ProfileResponse, UpdateRoleRequest,
        UserPermissions, UserQuery, UserResponse, UserRole, UserSearchResponse,
    },
    queries::{admin_queries, permission_queries, user_queries},
    utils::{
        extractors::{JsonBody, extract_user_id, require_admin, require_permission},
        jwt::Claims,
        password,
    },
};

// USER MANAGEMENT
pub async fn search_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<UserQuery>,
) -> Result<Json<UserSearchResponse>> {
    require_permission(&state.db, &claims, Permission::ManageUsers).await?;

    let users = admin_queries::search_users(&state.db, params).await?;
    Ok(Json(users))
}

pub async fn create_admin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(payload): JsonBody<CreateAdminRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>)> {
    require_permission(&state.db, &claims, Permission::ManageAdmins).await?;

    validate_email(&payload.email)?;
    password::validate_password(&payload.password)?;

    let email = payload.email.trim();

    if user_queries::find_by_email(&state.db, email).await?.is_some() {
        return Err(AppError::Conflict("User already exists with this email".to_string()));
    }

    let permissions = payload
        .permissions
        .unwrap_or_else(|| UserPermissions::defaults_for(UserRole::Admin));

    let password_hash = password::hash_password(&payload.password, state.auth.bcrypt_cost).await?;

    let user = user_queries::create_admin(
        &state.db,
        email,
        &password_hash,
        payload.first_name.trim(),
        payload.last_name.trim(),
        &permissions,
    )
    .await?;

    tracing::info!("Admin {} created by user {}", user.id, claims.sub);

    Ok((
        StatusCode::CREATED,
        Json(ProfileResponse {
            user: user.into(),
            permissions: Some(permissions),
        }),
    ))
}

pub async fn update_user_role(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<UpdateRoleRequest>,
) -> Result<Json<UserResponse>> {
    require_permission(&state.db, &claims, Permission::ManageUsers).await?;

    if extract_user_id(&claims)? == id {
        return Err(AppError::BadRequest("You cannot change your own role".to_string()));
    }

    let user = user_queries::update_role(&state.db, id, payload.role)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

    tracing::info!(
        "User {} is now {} (changed by user {})",
        user.id,
        user.role.as_str(),
        claims.sub
    );

    Ok(Json(user.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> Result<Json<DeletedResponse>> {
    require_permission(&state.db, &claims, Permission::ManageUsers).await?;

    if extract_user_id(&claims)? == id {
        return Err(AppError::BadRequest("You cannot delete your own account".to_string()));
    }

    if user_queries::delete_user(&state.db, id).await? == 0 {
        return Err(AppError::NotFound(format!("User with id {} not found", id)));
    }

    tracing::info!("User {} deleted by user {}", id, claims.sub);

    Ok(Json(DeletedResponse {
        message: "User deleted successfully".to_string(),
        id,
    }))
}

// PERMISSIONS
pub async fn list_admin_permissions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<AdminWithPermissions>>> {
    require_admin(&state.db, &claims).await?;

    let admins = permission_queries::list_admins(&state.db).await?;
    Ok(Json(admins))
}

pub async fn get_user_permissions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i32>,
) -> Result<Json<EffectivePermissions>> {
    require_admin(&state.db, &claims).await?;

    let user = user_queries::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;

    let stored = permission_queries::find_by_user_id(&state.db, user.id).await?;

    Ok(Json(EffectivePermissions {
        user_id: user.id,
        flags: UserPermissions::effective(user.role, stored),
    }))
}

pub async fn update_user_permissions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i32>,
    JsonBody(flags): JsonBody<UserPermissions>,
) -> Result<Json<PermissionRecord>> {
    require_permission(&state.db, &claims, Permission::ManageAdmins).await?;

    let user = user_queries::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;

    if user.role != UserRole::Admin {
        return Err(AppError::BadRequest(
            "Permissions can only be set for admin users".to_string(),
        ));
    }

    let record = permission_queries::upsert(&state.db, user.id, &flags).await?;

    tracing::info!("Permissions of user {} updated by user {}", user.id, claims.sub);

    Ok(Json(record))
}

// ANALYTICS
pub async fn analytics_summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<AnalyticsSummary>> {
    require_permission(&state.db, &claims, Permission::ViewAnalytics).await?;

    let summary = admin_queries::analytics_summary(&state.db).await?;
    Ok(Json(summary))
}
