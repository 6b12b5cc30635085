use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{AuthResponse, RegisterRequest, UserRole},
    queries::user_queries,
    utils::{extractors::JsonBody, jwt, password},
};

pub async fn register_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    validate_registration(&payload)?;

    let email = payload.email.trim();

    if user_queries::find_by_email(&state.db, email).await?.is_some() {
        return Err(AppError::Conflict("User already exists with this email".to_string()));
    }

    let password_hash = password::hash_password(&payload.password, state.auth.bcrypt_cost).await?;

    let user = user_queries::create_user(
        &state.db,
        email,
        &password_hash,
        payload.first_name.trim(),
        payload.last_name.trim(),
        UserRole::Customer,
    )
    .await?;

    let token = jwt::generate_token(&state.auth, user.id, &user.email, user.role)?;

    tracing::info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

pub(crate) fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());

    if !valid {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }

    Ok(())
}

fn validate_registration(payload: &RegisterRequest) -> Result<()> {
    validate_email(&payload.email)?;
    password::validate_password(&payload.password)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        }
    }

    #[test]
    fn accepts_reasonable_input() {
        assert!(validate_registration(&request("ada@example.com", "secret1")).is_ok());
    }

    #[test]
    fn rejects_malformed_email() {
        for email in ["", "ada", "@example.com", "ada@"] {
            assert!(
                validate_registration(&request(email, "secret1")).is_err(),
                "{email:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_short_password() {
        let err = validate_registration(&request("ada@example.com", "abc")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
