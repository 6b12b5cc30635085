use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    error::{AppError, Result},
    models::UserRole,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i32> {
        self.sub
            .parse::<i32>()
            .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

pub fn generate_token(
    config: &AuthConfig,
    user_id: i32,
    email: &str,
    role: UserRole,
) -> Result<String> {
    let now = chrono::Utc::now();
    let expiration = now
        .checked_add_signed(chrono::Duration::hours(config.token_ttl_hours))
        .ok_or_else(|| AppError::InternalError("Failed to calculate expiration".to_string()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role,
        iat: now.timestamp() as usize,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalError(format!("Token generation failed: {}", e)))
}

pub fn verify_token(config: &AuthConfig, token: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("Rejected token: {}", e);
        AppError::Unauthorized("Invalid token".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            token_ttl_hours: 1,
            bcrypt_cost: 4,
        }
    }

    #[test]
    fn token_round_trips_identity_and_role() {
        let cfg = config("test-secret");
        let token = generate_token(&cfg, 42, "admin@example.com", UserRole::Admin).unwrap();

        let claims = verify_token(&cfg, &token).unwrap();
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.email, "admin@example.com");
        assert_eq!(claims.role, UserRole::Admin);
        assert!(claims.is_admin());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_unauthorized() {
        let token = generate_token(&config("one"), 1, "a@b.c", UserRole::Customer).unwrap();
        let err = verify_token(&config("two"), &token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let cfg = AuthConfig {
            token_ttl_hours: -2,
            ..config("test-secret")
        };
        let token = generate_token(&cfg, 1, "a@b.c", UserRole::Customer).unwrap();
        assert!(verify_token(&cfg, &token).is_err());
    }

    #[test]
    fn garbage_is_unauthorized() {
        let err = verify_token(&config("s"), "not-a-jwt").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
