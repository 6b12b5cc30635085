use crate::error::{AppError, Result};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// bcrypt is CPU-bound, so both operations run on the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_owned();

    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::InternalError(format!("Hashing task failed: {}", e)))?
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_owned();
    let hash = hash.to_owned();

    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::InternalError(format!("Verification task failed: {}", e)))?
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {}", e)))
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    Ok(())
}
