use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use sqlx::PgPool;

use crate::{
    error::{AppError, Result},
    models::{Permission, UserPermissions, UserRole},
    queries::permission_queries,
    utils::jwt::Claims,
};

/// `axum::Json` with rejections turned into `AppError::BadRequest`, so clients
/// always get a JSON `{"message"}` body.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}

pub fn extract_user_id(claims: &Claims) -> Result<i32> {
    claims.user_id()
}

/// Role and permissions as currently stored, not as baked into the token.
/// A token outliving its account is rejected with 401.
pub async fn current_access(
    pool: &PgPool,
    claims: &Claims,
) -> Result<(UserRole, UserPermissions)> {
    let user_id = extract_user_id(claims)?;
    let (role, stored) = permission_queries::find_access(pool, user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

    Ok((role, UserPermissions::effective(role, stored)))
}

/// Fails with 403 unless the caller is currently an admin.
pub async fn require_admin(pool: &PgPool, claims: &Claims) -> Result<UserPermissions> {
    let (role, effective) = current_access(pool, claims).await?;

    if role != UserRole::Admin {
        tracing::warn!("User {} holds an admin token but is now {}", claims.sub, role.as_str());
        return Err(AppError::Forbidden("Access denied. Admin only.".to_string()));
    }

    Ok(effective)
}

/// Fails with 403 unless the caller is currently an admin whose effective
/// permissions include `permission`.
pub async fn require_permission(
    pool: &PgPool,
    claims: &Claims,
    permission: Permission,
) -> Result<UserPermissions> {
    if !claims.is_admin() {
        return Err(AppError::Forbidden("Access denied. Admin only.".to_string()));
    }

    let effective = require_admin(pool, claims).await?;

    if !effective.allows(permission) {
        tracing::warn!(
            "User {} denied: missing '{}' permission",
            claims.sub,
            permission.describe()
        );
        return Err(AppError::Forbidden(format!(
            "You do not have permission to {}.",
            permission.describe()
        )));
    }

    Ok(effective)
}
