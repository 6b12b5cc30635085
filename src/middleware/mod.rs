use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    AppState,
    error::AppError,
    utils::jwt::{self, Claims},
};

fn authenticate(state: &AppState, req: &Request) -> Result<Claims, AppError> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid token format".to_string()))?;

    jwt::verify_token(&state.auth, token.trim())
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&state, &req)?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Cheap pre-filter on the token role. Handlers re-check the stored role
/// before acting, since a token can outlive a demotion.
pub async fn admin_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&state, &req)?;

    if !claims.is_admin() {
        tracing::warn!("Non-admin user {} hit {}", claims.sub, req.uri().path());
        return Err(AppError::Forbidden("Access denied. Admin only.".to_string()));
    }

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
